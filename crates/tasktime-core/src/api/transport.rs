//! The seam between the caching pipeline and the network.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use super::request::Request;
use super::ApiError;

/// HTTP request timeout in seconds. A timeout is an ordinary read failure.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request` and return the decoded JSON payload.
    async fn send(&self, request: &Request) -> Result<Value, ApiError>;
}

/// reqwest-backed transport against a fixed base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Value, ApiError> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .header(header::ACCEPT, "application/json");
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::from_reqwest(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::from_reqwest(&e))?;

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &text));
        }
        // 204 No Content and friends
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("{} {}: {}", request.method, request.path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new("http://localhost:8000/", Duration::from_secs(1))
            .expect("client");
        assert_eq!(transport.url("/tasks"), "http://localhost:8000/tasks");
        assert_eq!(transport.url("tasks/3"), "http://localhost:8000/tasks/3");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error_with_500() {
        // Port 9 (discard) on localhost is closed on any sane test machine
        let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client");
        let err = transport.send(&Request::get("/tasks")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.is_transport());
    }
}
