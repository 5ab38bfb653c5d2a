//! Application configuration for tallydb
//!
//! Loaded from a JSON file. Every field has a default so a partial file (or
//! `{}`) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::query::directory::NameDirectory;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tally.db")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Configuration for the time-series store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the embedded database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long a connection waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// Creates a store configuration for the given file with default timeouts
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(default_db_path())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: StoreConfig,
    /// Prometheus listener address; metrics are not exported when unset
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    /// Ids allowed to append to their own entity
    #[serde(default)]
    pub writers: Vec<String>,
    /// Ids allowed to read cross-entity reports
    #[serde(default)]
    pub readers: Vec<String>,
    /// Display names for the consolidated report, in report order
    #[serde(default)]
    pub directory: NameDirectory,
}

impl AppConfig {
    /// Reads and parses a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.database.path, PathBuf::from("tally.db"));
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
        assert!(config.metrics_addr.is_none());
        assert!(config.writers.is_empty());
        assert!(config.readers.is_empty());
        assert!(config.directory.is_empty());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "database": { "path": "/var/lib/tally/data.db", "busy_timeout_ms": 250 },
            "metrics_addr": "127.0.0.1:9090",
            "writers": ["42", "7"],
            "readers": ["1"],
            "directory": [
                { "entity_id": "7", "display_name": "Alice" },
                { "entity_id": "42", "display_name": "Bob" }
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/var/lib/tally/data.db"));
        assert_eq!(config.database.busy_timeout(), Duration::from_millis(250));
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9090".parse().unwrap()));
        assert_eq!(config.writers, vec!["42", "7"]);
        assert_eq!(config.readers, vec!["1"]);

        let ids: Vec<_> = config.directory.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["7", "42"]);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            AppConfig::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.json");
        let mut file = std::fs::File::create(&broken).unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }
}
