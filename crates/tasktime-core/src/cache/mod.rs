//! Local caching module for offline data access.
//!
//! - `CacheStore` / `SharedCache`: TTL key/value store with lazy expiry
//! - `key`: canonical cache keys derived from request shape
//! - `PersistenceBridge`: periodic, best-effort sync to a durable medium

pub mod key;
pub mod persistence;
pub mod storage;
pub mod store;

pub use key::{cache_key, read_key, stale_key};
pub use persistence::{PersistenceBridge, PersistenceHandle, DEFAULT_PERSIST_INTERVAL, NAMESPACE_KEY};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, PersistenceError};
pub use store::{CacheEntry, CacheStore, SharedCache, DEFAULT_TTL};
