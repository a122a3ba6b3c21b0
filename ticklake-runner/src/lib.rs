//! TickLake Runner — batch orchestration on top of `ticklake-core`.
//!
//! This crate turns the leaf components into resumable range loads:
//! - Loader configuration (TOML file + defaults)
//! - Durable batch progress with atomic writes and versioned keys
//! - Date-range partitioning and market-aware hour expansion
//! - Bounded-parallel batch execution on a rayon pool
//! - The `load range` / `load latest` orchestrator
//! - Post-run OHLC candle regeneration via store SQL

pub mod batch;
pub mod config;
pub mod loader;
pub mod ohlc;
pub mod progress;
pub mod scheduler;

pub use batch::{expand_hours, plan_batches, Batch, HourTask};
pub use config::{ConfigError, LoaderConfig};
pub use loader::{LoadProgress, Loader, RunSummary, SilentLoadProgress, StdoutLoadProgress};
pub use ohlc::{generate_ohlc, OHLC_TIMEFRAMES};
pub use progress::{batch_key, ProgressMap, ProgressStore};
pub use scheduler::{run_batch, BatchReport};
