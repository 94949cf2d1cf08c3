//! Cache-aside interceptor pipeline around a [`Transport`].
//!
//! Every call goes through three phases:
//!
//! 1. request: derive the cache key; a fresh hit on a read returns at once
//! 2. success: reads are cached (fresh TTL by URL pattern, plus a 24h stale
//!    copy); mutations invalidate the collection and single-item keys
//! 3. failure: reads fall back to the stale copy, everything else propagates

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::request::Request;
use super::transport::Transport;
use super::ApiError;
use crate::cache::{cache_key, read_key, stale_key, SharedCache};

/// Lifetime of a single-resource read such as `/tasks/3`.
pub const ITEM_TTL: Duration = Duration::from_secs(5 * 60);
/// Lifetime of a collection read such as `/tasks`.
pub const COLLECTION_TTL: Duration = Duration::from_secs(2 * 60);
/// Lifetime of the suggestions resource.
pub const SUGGESTIONS_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_READ_TTL: Duration = Duration::from_secs(5 * 60);
/// Lifetime of the fallback copy kept for failed reads.
pub const STALE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const SUGGESTIONS_SEGMENT: &str = "suggestions";

/// Where a response's payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub data: Value,
    pub source: ResponseSource,
}

impl Response {
    fn new(data: Value, source: ResponseSource) -> Self {
        Self { data, source }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.data).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Shape of a URL path, used for TTL classification and invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resource<'a> {
    Suggestions,
    Collection(&'a str),
    Item { collection: &'a str },
    Other,
}

impl<'a> Resource<'a> {
    fn classify(path: &'a str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [first, ..] if *first == SUGGESTIONS_SEGMENT => Resource::Suggestions,
            [collection] => Resource::Collection(*collection),
            [collection, _id] => Resource::Item {
                collection: *collection,
            },
            _ => Resource::Other,
        }
    }

    fn read_ttl(&self) -> Duration {
        match self {
            Resource::Suggestions => SUGGESTIONS_TTL,
            Resource::Collection(_) => COLLECTION_TTL,
            Resource::Item { .. } => ITEM_TTL,
            Resource::Other => DEFAULT_READ_TTL,
        }
    }
}

/// HTTP client with cache-aside reads, mutation invalidation and stale
/// fallback. Clone is cheap; clones share the transport and the cache.
#[derive(Clone)]
pub struct CachingClient {
    transport: Arc<dyn Transport>,
    cache: SharedCache,
}

impl CachingClient {
    pub fn new(transport: Arc<dyn Transport>, cache: SharedCache) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Run `request` through the pipeline.
    pub async fn execute(&self, request: Request) -> Result<Response, ApiError> {
        let key = cache_key(&request);

        if request.method.is_read() {
            if let Some(data) = self.cache.get(&key) {
                debug!(key = %key, "Cache hit");
                return Ok(Response::new(data, ResponseSource::Cache));
            }
        }

        match self.transport.send(&request).await {
            Ok(data) => {
                self.commit(&request, &key, &data);
                Ok(Response::new(data, ResponseSource::Network))
            }
            Err(err @ ApiError::Transport { .. }) if request.method.is_read() => {
                self.stale_fallback(&key, err)
            }
            Err(err) => Err(err),
        }
    }

    /// Execute and decode the payload into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        self.execute(request).await?.decode()
    }

    fn commit(&self, request: &Request, key: &str, data: &Value) {
        if request.method.is_read() {
            let ttl = Resource::classify(&request.path).read_ttl();
            self.cache.set_with_ttl(key, data.clone(), ttl);
            self.cache.set_with_ttl(&stale_key(key), data.clone(), STALE_TTL);
            debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached response");
        } else {
            self.invalidate(&request.path);
        }
    }

    /// Exact-match removal of the collection key and, for an item path, the
    /// item key. Stale copies are left alone.
    fn invalidate(&self, path: &str) {
        let keys = match Resource::classify(path) {
            Resource::Collection(_) => vec![read_key(path)],
            Resource::Item { collection } => {
                vec![read_key(&format!("/{}", collection)), read_key(path)]
            }
            Resource::Suggestions | Resource::Other => Vec::new(),
        };
        for key in keys {
            if self.cache.delete(&key) {
                debug!(key = %key, "Invalidated cache entry");
            }
        }
    }

    fn stale_fallback(&self, key: &str, err: ApiError) -> Result<Response, ApiError> {
        match self.cache.get(&stale_key(key)) {
            Some(data) => {
                info!(key = %key, error = %err, "Serving stale data after failed read");
                Ok(Response::new(data, ResponseSource::Stale))
            }
            None => {
                warn!(key = %key, error = %err, "Read failed with no stale data");
                Err(err)
            }
        }
    }
}
