//! tasktime core library.
//!
//! Client-side resilience layer between application code and the remote
//! task API:
//!
//! - `cache`: TTL key/value store, cache keys and the persistence bridge
//! - `api`: transport seam, caching interceptor pipeline and task operations
//! - `suggestions`: ranked time-window suggestions with synthetic fallback
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod models;
pub mod suggestions;
pub mod utils;

pub use api::{ApiError, CachingClient, HttpTransport, TaskService, Transport};
pub use cache::{CacheStore, PersistenceBridge, PersistenceHandle, SharedCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use suggestions::SuggestionEngine;
