//! Durable media the persistence bridge can write to.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache blob could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// A string key/value medium that outlives the process.
pub trait DurableStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// One JSON file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl DurableStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        // Write then rename so a crash mid-write never leaves a torn blob.
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, self.path(key))?;
        Ok(())
    }
}

/// In-process medium with an optional size quota.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes whose value is larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DurableStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(PersistenceError::QuotaExceeded {
                    needed: value.len(),
                    quota,
                });
            }
        }
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.read("blob").expect("read").is_none());
        storage.write("blob", "[1,2,3]").expect("write");
        assert_eq!(storage.read("blob").expect("read").as_deref(), Some("[1,2,3]"));

        storage.write("blob", "[]").expect("overwrite");
        assert_eq!(storage.read("blob").expect("read").as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_storage_quota() {
        let storage = MemoryStorage::with_quota(4);
        storage.write("k", "abcd").expect("fits");
        let err = storage.write("k", "abcde").unwrap_err();
        assert!(matches!(err, PersistenceError::QuotaExceeded { needed: 5, quota: 4 }));
        // Failed write leaves the previous value alone
        assert_eq!(storage.read("k").expect("read").as_deref(), Some("abcd"));
    }
}
