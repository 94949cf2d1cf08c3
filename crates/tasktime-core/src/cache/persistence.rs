//! Best-effort bridge between the in-memory cache and a durable medium.
//!
//! The whole store is written as one JSON array of `[key, entry]` pairs under
//! [`NAMESPACE_KEY`]. Nothing in here ever returns an error to the caller:
//! failures are logged and the cache keeps working from memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::storage::{DurableStorage, PersistenceError};
use super::store::{CacheEntry, SharedCache};

/// Fixed key the serialized store lives under.
pub const NAMESPACE_KEY: &str = "tasktime-cache";

/// How often the background task snapshots the store.
pub const DEFAULT_PERSIST_INTERVAL: Duration = Duration::from_secs(30);

const MIN_PERSIST_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct PersistenceBridge {
    cache: SharedCache,
    storage: Arc<dyn DurableStorage>,
}

impl PersistenceBridge {
    pub fn new(cache: SharedCache, storage: Arc<dyn DurableStorage>) -> Self {
        Self { cache, storage }
    }

    /// Snapshot every entry to the durable medium. Failures are logged.
    pub fn persist(&self) {
        match self.try_persist() {
            Ok(count) => debug!(entries = count, "Cache persisted"),
            Err(e) => warn!(error = %e, "Failed to persist cache"),
        }
    }

    fn try_persist(&self) -> Result<usize, PersistenceError> {
        let entries = self.cache.snapshot();
        let blob = serde_json::to_string(&entries)?;
        self.storage.write(NAMESPACE_KEY, &blob)?;
        Ok(entries.len())
    }

    /// Load the persisted blob into the store, dropping entries that have
    /// already expired. Returns how many live entries were restored.
    pub fn restore(&self) -> usize {
        match self.try_restore() {
            Ok(count) => {
                info!(entries = count, "Cache restored");
                count
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cache blob");
                0
            }
        }
    }

    fn try_restore(&self) -> Result<usize, PersistenceError> {
        let Some(blob) = self.storage.read(NAMESPACE_KEY)? else {
            debug!("No persisted cache found");
            return Ok(0);
        };
        let entries: Vec<(String, CacheEntry)> = serde_json::from_str(&blob)?;

        Ok(self.cache.with(|store| {
            let now = store.now_ms();
            let mut restored = 0;
            for (key, entry) in entries {
                if entry.is_valid(now) {
                    store.insert_entry(key, entry);
                    restored += 1;
                }
            }
            store.purge_expired();
            restored
        }))
    }

    /// Spawn a task that persists every `every`, first tick one period from
    /// now. Must be called from within a tokio runtime.
    pub fn start_background(&self, every: Duration) -> PersistenceHandle {
        // tokio intervals panic on a zero period
        let every = every.max(MIN_PERSIST_INTERVAL);
        let bridge = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => bridge.persist(),
                    _ = &mut stop_rx => {
                        bridge.persist();
                        break;
                    }
                }
            }
            debug!("Background persistence stopped");
        });

        info!(interval_secs = every.as_secs(), "Background persistence started");
        PersistenceHandle {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Cancellation handle for background persistence.
///
/// `stop` flushes once more before returning; dropping the handle aborts the
/// task without a final flush.
pub struct PersistenceHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PersistenceHandle {
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Background persistence task failed");
            }
        }
    }
}

impl Drop for PersistenceHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn setup() -> (SharedCache, ManualClock, Arc<MemoryStorage>, PersistenceBridge) {
        let clock = ManualClock::new(1_000);
        let cache = SharedCache::new(Arc::new(clock.clone()));
        let storage = Arc::new(MemoryStorage::new());
        let bridge = PersistenceBridge::new(cache.clone(), storage.clone());
        (cache, clock, storage, bridge)
    }

    #[test]
    fn test_persist_then_restore_into_empty_store() {
        let (cache, clock, storage, bridge) = setup();
        cache.set_with_ttl_ms("short", json!({"a": 1}), 500);
        cache.set_with_ttl_ms("long", json!([1, 2, 3]), 60_000);
        cache.set_with_ttl_ms("GET /tasks", json!([{"id": 1}]), 120_000);
        bridge.persist();
        let before = cache.snapshot();

        // Fresh process: new store, same medium, time has moved on
        clock.advance(1_000);
        let fresh = SharedCache::new(Arc::new(clock.clone()));
        let restored = PersistenceBridge::new(fresh.clone(), storage).restore();

        assert_eq!(restored, 2);
        assert_eq!(fresh.get("short"), None);
        let after = fresh.snapshot();
        for (key, entry) in &after {
            let original = before.iter().find(|(k, _)| k == key).expect("persisted");
            assert_eq!(&original.1, entry);
        }
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_blob_is_list_of_key_entry_pairs() {
        let (cache, _clock, storage, bridge) = setup();
        cache.set_with_ttl_ms("k", json!("v"), 10);
        bridge.persist();

        let blob = storage.read(NAMESPACE_KEY).expect("read").expect("written");
        let parsed: serde_json::Value = serde_json::from_str(&blob).expect("json");
        assert_eq!(
            parsed,
            json!([["k", {"data": "v", "timestamp": 1000, "ttl": 10}]])
        );
    }

    #[test]
    fn test_restore_missing_blob_is_noop() {
        let (cache, _clock, _storage, bridge) = setup();
        assert_eq!(bridge.restore(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_restore_corrupt_blob_is_noop() {
        let (cache, _clock, storage, bridge) = setup();
        storage.write(NAMESPACE_KEY, "{not json").expect("write");
        cache.set("existing", json!(1));
        assert_eq!(bridge.restore(), 0);
        assert_eq!(cache.get("existing"), Some(json!(1)));
    }

    #[test]
    fn test_restore_extreme_timestamps_are_dropped() {
        let (cache, _clock, storage, bridge) = setup();
        storage
            .write(
                NAMESPACE_KEY,
                r#"[["ancient",{"data":1,"timestamp":-9223372036854775808,"ttl":10}],
                    ["future",{"data":2,"timestamp":9223372036854775807,"ttl":10}],
                    ["ok",{"data":3,"timestamp":1000,"ttl":10}]]"#,
            )
            .expect("write");

        assert_eq!(bridge.restore(), 2);
        assert_eq!(cache.get("ancient"), None);
        assert_eq!(cache.get("ok"), Some(json!(3)));
    }

    #[test]
    fn test_persist_quota_failure_is_swallowed() {
        let clock = ManualClock::new(0);
        let cache = SharedCache::new(Arc::new(clock));
        let storage = Arc::new(MemoryStorage::with_quota(8));
        let bridge = PersistenceBridge::new(cache.clone(), storage.clone());

        cache.set("big", json!("a value far larger than eight bytes"));
        bridge.persist();

        assert!(storage.read(NAMESPACE_KEY).expect("read").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_persists_on_interval_and_on_stop() {
        let (cache, _clock, storage, bridge) = setup();
        let handle = bridge.start_background(Duration::from_secs(30));

        cache.set("first", json!(1));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(storage.read(NAMESPACE_KEY).expect("read").is_none());

        tokio::time::sleep(Duration::from_secs(25)).await;
        let blob = storage.read(NAMESPACE_KEY).expect("read").expect("ticked");
        assert!(blob.contains("first"));

        cache.set("second", json!(2));
        handle.stop().await;
        let blob = storage.read(NAMESPACE_KEY).expect("read").expect("flushed");
        assert!(blob.contains("second"));
    }
}
