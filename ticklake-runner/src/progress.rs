//! Durable batch progress: the resumability record.
//!
//! A JSON map of versioned batch key → ISO date of the batch's last
//! completed day, persisted at a fixed path. Saves are atomic (write to
//! .tmp, rename into place) so a crash mid-write never leaves a corrupt
//! file; a corrupt or unreadable file degrades to "no prior progress"
//! rather than failing the run.
//!
//! Keys carry an explicit scheme version so a future change to batching
//! (e.g. sub-day resume) invalidates old entries loudly instead of
//! silently misreading them.

use crate::batch::Batch;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Current progress-key scheme version.
pub const PROGRESS_KEY_VERSION: &str = "v1";

/// Batch key → last completed date.
pub type ProgressMap = BTreeMap<String, NaiveDate>;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to persist progress to {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stable key for one batch under the current scheme version.
pub fn batch_key(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{PROGRESS_KEY_VERSION}:{symbol}:{start}:{end}")
}

/// File-backed progress store. Written only by the orchestrator thread.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the full mapping. Absent or malformed files yield an empty map —
    /// a full restart is the documented recovery for progress corruption.
    pub fn load(&self) -> ProgressMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ProgressMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "progress file unreadable, starting fresh");
                return ProgressMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "progress file malformed, starting fresh");
                ProgressMap::new()
            }
        }
    }

    /// Persist the full mapping atomically.
    pub fn save(&self, map: &ProgressMap) -> Result<(), ProgressError> {
        let write_err = |source: std::io::Error| ProgressError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            write_err(e)
        })?;

        Ok(())
    }

    /// Whether the map records this batch as fully completed.
    pub fn is_complete(map: &ProgressMap, batch: &Batch) -> bool {
        map.get(&batch.key()).is_some_and(|date| *date >= batch.end)
    }

    /// Record a batch as complete through its final day.
    pub fn mark_complete(map: &mut ProgressMap, batch: &Batch) {
        map.insert(batch.key(), batch.end);
    }
}
