//! On-disk blob cache for raw archive hours.
//!
//! Layout: `{cache_dir}/{SYMBOL}/{YYYYMMDD}_{HH}.bi5`
//!
//! Each entry holds the raw compressed blob exactly as the vendor served it.
//! Writes are whole-file and atomic (write to .tmp, rename into place), and
//! keys are disjoint across concurrent workers, so no locking is needed.
//! Presence of a file means "skip the network fetch."

use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache read failed for {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("cache write failed for {path}: {source}")]
    Write { path: String, source: io::Error },
}

/// Per-symbol status line for `cache status`.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub symbol: String,
    pub blob_count: usize,
    pub total_bytes: u64,
}

/// File-backed cache of compressed hour blobs.
pub struct BlobCache {
    cache_dir: PathBuf,
}

impl BlobCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Deterministic file key for one (symbol, date, hour).
    pub fn blob_path(&self, symbol: &str, date: NaiveDate, hour: u8) -> PathBuf {
        self.cache_dir
            .join(symbol)
            .join(format!("{}_{hour:02}.bi5", date.format("%Y%m%d")))
    }

    /// Read a cached blob. `Ok(None)` on a miss.
    pub fn get(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.blob_path(symbol, date, hour);
        match fs::read(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Read {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Store a blob atomically: write to `.tmp`, then rename into place.
    pub fn put(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
        blob: &[u8],
    ) -> Result<(), CacheError> {
        let path = self.blob_path(symbol, date, hour);
        let write_err = |source: io::Error| CacheError::Write {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = path.with_extension("bi5.tmp");
        fs::write(&tmp_path, blob).map_err(write_err)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            write_err(e)
        })?;

        Ok(())
    }

    /// Per-symbol blob counts and sizes, sorted by symbol.
    pub fn status(&self) -> Vec<CacheStatus> {
        let mut rows = Vec::new();

        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return rows;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let symbol = entry.file_name().to_string_lossy().to_string();

            let mut blob_count = 0;
            let mut total_bytes = 0;
            if let Ok(blobs) = fs::read_dir(&path) {
                for blob in blobs.flatten() {
                    if blob.path().extension().and_then(|e| e.to_str()) != Some("bi5") {
                        continue;
                    }
                    blob_count += 1;
                    if let Ok(meta) = blob.metadata() {
                        total_bytes += meta.len();
                    }
                }
            }

            rows.push(CacheStatus {
                symbol,
                blob_count,
                total_bytes,
            });
        }

        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        rows
    }
}
