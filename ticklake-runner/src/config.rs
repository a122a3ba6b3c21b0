//! Loader configuration: TOML file with serde defaults.
//!
//! Every field has a default suitable for a local store instance, so a bare
//! `ticklake load ...` works without a config file. CLI flags override the
//! documented fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Vendor archive base URL.
    pub archive_url: String,

    /// Store ILP (line protocol) address, host:port.
    pub ilp_addr: String,

    /// Store SQL-over-HTTP base URL.
    pub http_url: String,

    /// Directory for cached hour blobs.
    pub cache_dir: PathBuf,

    /// Path of the durable batch-progress file.
    pub progress_path: PathBuf,

    /// Days per resumable batch.
    pub batch_days: u32,

    /// Worker threads per batch.
    pub max_workers: usize,

    /// Rows per bulk-insert chunk.
    pub chunk_size: usize,

    /// Per-request archive fetch timeout, seconds.
    pub fetch_timeout_secs: u64,

    /// Retry budget shared by fetch and ingestion.
    pub max_retries: u32,

    /// Base backoff delay, milliseconds.
    pub retry_base_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://datafeed.dukascopy.com/datafeed".to_string(),
            ilp_addr: "localhost:9009".to_string(),
            http_url: "http://localhost:9000".to_string(),
            cache_dir: PathBuf::from("cache"),
            progress_path: PathBuf::from(".batch_progress.json"),
            batch_days: 3,
            max_workers: 10,
            chunk_size: 1000,
            fetch_timeout_secs: 30,
            max_retries: 3,
            retry_base_ms: 500,
        }
    }
}

impl LoaderConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = LoaderConfig::from_toml("").unwrap();
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = LoaderConfig::from_toml(
            r#"
ilp_addr = "questdb.internal:9009"
batch_days = 1
max_workers = 4
"#,
        )
        .unwrap();

        assert_eq!(config.ilp_addr, "questdb.internal:9009");
        assert_eq!(config.batch_days, 1);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.chunk_size, LoaderConfig::default().chunk_size);
        assert_eq!(config.archive_url, LoaderConfig::default().archive_url);
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ticklake.toml");
        std::fs::write(&path, "chunk_size = 500\n").unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.chunk_size, 500);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = LoaderConfig::from_file(Path::new("/nonexistent/ticklake.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
