//! Type-erased TTL key/value store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::Clock;

/// Default entry lifetime when the caller does not pick one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached payload with the time it was written and how long it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T = Value> {
    pub data: T,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    /// Lifetime in milliseconds. Zero or negative means already expired.
    pub ttl: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, timestamp: i64, ttl: i64) -> Self {
        Self {
            data,
            timestamp,
            ttl,
        }
    }

    pub fn is_valid(&self, now_ms: i64) -> bool {
        self.ttl > 0 && now_ms.saturating_sub(self.timestamp) <= self.ttl
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        !self.is_valid(now_ms)
    }
}

pub(crate) fn duration_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// In-memory TTL store. Expired entries are evicted lazily when read.
pub struct CacheStore {
    entries: BTreeMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: BTreeMap::new(),
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Store `value` with the default TTL.
    pub fn set(&mut self, key: &str, value: Value) {
        self.set_with_ttl(key, value, duration_ms(DEFAULT_TTL));
    }

    /// Store `value` for `ttl_ms` milliseconds, replacing any previous entry.
    pub fn set_with_ttl(&mut self, key: &str, value: Value, ttl_ms: i64) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        self.entries.insert(key.to_string(), entry);
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();
        let entry = self.entries.get(key)?;
        if entry.is_valid(now) {
            return Some(entry.data.clone());
        }
        debug!(key = key, "Evicting expired cache entry");
        self.entries.remove(key);
        None
    }

    /// Typed read. A payload that does not match `T` counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key = key, error = %e, "Cached payload has unexpected shape");
                None
            }
        }
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries ordered by key, expired ones included.
    pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert an entry verbatim, keeping its original timestamp.
    pub fn insert_entry(&mut self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    /// Drop every entry that is expired right now. Returns how many went.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid(now));
        before - self.entries.len()
    }
}

/// Cloneable handle to the process-wide cache.
///
/// The lock is only held for the duration of a single synchronous store
/// operation, never across an await point.
#[derive(Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<CacheStore>>,
}

impl SharedCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheStore::new(clock))),
        }
    }

    /// Run `f` against the locked store.
    pub fn with<R>(&self, f: impl FnOnce(&mut CacheStore) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore> {
        // A panic while holding the lock cannot leave an entry half-written,
        // so a poisoned store is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn now_ms(&self) -> i64 {
        self.lock().now_ms()
    }

    pub fn set(&self, key: &str, value: Value) {
        self.lock().set(key, value);
    }

    pub fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) {
        self.lock().set_with_ttl(key, value, duration_ms(ttl));
    }

    pub fn set_with_ttl_ms(&self, key: &str, value: Value, ttl_ms: i64) {
        self.lock().set_with_ttl(key, value, ttl_ms);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key)
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lock().get_as(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.lock().delete(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        self.lock().snapshot()
    }
}
