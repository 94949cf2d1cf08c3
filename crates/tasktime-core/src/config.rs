//! Application configuration management.
//!
//! Configuration is stored at `~/.config/tasktime/config.json`. Environment
//! variables (`TASKTIME_API_URL`, `TASKTIME_CACHE_DIR`) override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DEFAULT_TIMEOUT_SECS;
use crate::cache::DEFAULT_PERSIST_INTERVAL;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tasktime";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_URL: &str = "http://localhost:8000";

const ENV_API_URL: &str = "TASKTIME_API_URL";
const ENV_CACHE_DIR: &str = "TASKTIME_CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub persist_interval_secs: u64,
    /// Overrides the platform cache directory when set.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            persist_interval_secs: DEFAULT_PERSIST_INTERVAL.as_secs(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load from disk (defaults when absent), then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|name| std::env::var(name).ok());
        debug!(api = %config.api_base_url, "Config loaded");
        Ok(config)
    }

    /// Read the file at `path`, defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = var(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_secs(self.persist_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.persist_interval(), Duration::from_secs(30));
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url": "https://tasks.example.com"}"#).expect("parse");
        assert_eq!(config.api_base_url, "https://tasks.example.com");
        assert_eq!(config.persist_interval_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|name| match name {
            "TASKTIME_API_URL" => Some("http://api.local".to_string()),
            "TASKTIME_CACHE_DIR" => Some("/tmp/tasktime-test".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://api.local");
        assert_eq!(
            config.cache_dir().expect("dir"),
            PathBuf::from("/tmp/tasktime-test")
        );
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasktime").join(CONFIG_FILE);

        assert_eq!(Config::load_from(&path).expect("missing"), Config::default());

        let config = Config {
            api_base_url: "https://tasks.example.com".to_string(),
            persist_interval_secs: 5,
            cache_dir: Some(PathBuf::from("/var/cache/tasktime")),
            ..Config::default()
        };
        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ nope").expect("write");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }
}
