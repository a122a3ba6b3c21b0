//! TickLake CLI — historical tick loading and store maintenance commands.
//!
//! Commands:
//! - `load` — backfill a symbol over a date range in resumable batches
//! - `daily` — load yesterday (UTC) for a set of symbols
//! - `ohlc` — regenerate candle tables from already-loaded ticks
//! - `verify` — report store-side coverage for a symbol and range
//! - `cache status` — report cached blob counts and sizes per symbol

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use ticklake_core::archive::ArchiveClient;
use ticklake_core::cache::BlobCache;
use ticklake_core::fetch::FetchClient;
use ticklake_core::query::{StoreQueryClient, TICK_TABLE};
use ticklake_core::retry::RetryPolicy;
use ticklake_core::sink::{IlpTcpSink, IngestionSink};
use ticklake_runner::{generate_ohlc, Loader, LoaderConfig, ProgressStore, StdoutLoadProgress};

#[derive(Parser)]
#[command(
    name = "ticklake",
    about = "TickLake CLI — historical FX tick ingestion pipeline"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backfill a symbol over a date range in resumable batches.
    Load {
        /// Symbol to load (e.g., EURUSD).
        symbol: String,

        /// Start date (YYYY-MM-DD), inclusive.
        start: String,

        /// End date (YYYY-MM-DD), inclusive.
        end: String,

        /// Days per resumable batch.
        #[arg(long)]
        batch_days: Option<u32>,

        /// Worker threads per batch.
        #[arg(long)]
        workers: Option<usize>,

        /// Re-run batches already recorded as complete.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Regenerate OHLC candle tables after a successful load.
        #[arg(long, default_value_t = false)]
        generate_ohlc: bool,

        /// Report store-side coverage after the load.
        #[arg(long, default_value_t = false)]
        verify: bool,
    },
    /// Load yesterday (UTC) for each symbol as a one-day batch.
    Daily {
        /// Symbols to load.
        #[arg(long, num_args = 1.., default_values_t = [String::from("EURUSD")])]
        symbols: Vec<String>,

        /// Regenerate OHLC candle tables after a successful load.
        #[arg(long, default_value_t = false)]
        generate_ohlc: bool,

        /// Report store-side coverage after the load.
        #[arg(long, default_value_t = false)]
        verify: bool,
    },
    /// Regenerate candle tables from already-loaded ticks.
    Ohlc {
        symbol: String,
        start: String,
        end: String,
    },
    /// Report store-side tick coverage for a symbol and range.
    Verify {
        symbol: String,
        start: String,
        end: String,
    },
    /// Blob cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached blob counts and sizes per symbol.
    Status {
        /// Cache directory override.
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Load {
            symbol,
            start,
            end,
            batch_days,
            workers,
            force,
            generate_ohlc,
            verify,
        } => run_load(
            &config,
            &symbol,
            &start,
            &end,
            batch_days,
            workers,
            force,
            generate_ohlc,
            verify,
        ),
        Commands::Daily {
            symbols,
            generate_ohlc,
            verify,
        } => run_daily(&config, &symbols, generate_ohlc, verify),
        Commands::Ohlc { symbol, start, end } => run_ohlc(&config, &symbol, &start, &end),
        Commands::Verify { symbol, start, end } => run_verify(&config, &symbol, &start, &end),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => {
                run_cache_status(cache_dir.as_deref().unwrap_or(&config.cache_dir))
            }
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<LoaderConfig> {
    match path {
        Some(path) => LoaderConfig::from_file(path).context("failed to load config"),
        None => Ok(LoaderConfig::default()),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

fn build_feed(config: &LoaderConfig) -> FetchClient {
    let retry = RetryPolicy::new(
        config.max_retries,
        Duration::from_millis(config.retry_base_ms),
    );
    let archive = ArchiveClient::new(
        &config.archive_url,
        Duration::from_secs(config.fetch_timeout_secs),
        retry,
    );
    FetchClient::new(archive, BlobCache::new(&config.cache_dir))
}

fn build_sink(config: &LoaderConfig) -> IngestionSink {
    let retry = RetryPolicy::new(
        config.max_retries,
        Duration::from_millis(config.retry_base_ms),
    );
    IngestionSink::new(
        Box::new(IlpTcpSink::new(&config.ilp_addr, TICK_TABLE)),
        config.chunk_size,
        retry,
    )
}

fn build_query(config: &LoaderConfig) -> StoreQueryClient {
    StoreQueryClient::new(
        &config.http_url,
        Duration::from_secs(config.fetch_timeout_secs),
    )
}

#[allow(clippy::too_many_arguments)]
fn run_load(
    config: &LoaderConfig,
    symbol: &str,
    start: &str,
    end: &str,
    batch_days: Option<u32>,
    workers: Option<usize>,
    force: bool,
    with_ohlc: bool,
    with_verify: bool,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    let feed = build_feed(config);
    let sink = build_sink(config);
    let store = ProgressStore::new(&config.progress_path);
    let loader = Loader::new(
        &feed,
        &sink,
        &store,
        workers.unwrap_or(config.max_workers),
        batch_days.unwrap_or(config.batch_days),
    );

    let summary = loader.load_range(symbol, start, end, force, &StdoutLoadProgress);

    if !summary.all_succeeded() {
        for batch in &summary.failed {
            eprintln!("Failed: {batch}");
        }
        std::process::exit(1);
    }

    if with_ohlc {
        report_ohlc(&build_query(config), symbol, start, end);
    }
    if with_verify {
        report_coverage(&build_query(config), symbol, start, end)?;
    }

    Ok(())
}

fn run_daily(
    config: &LoaderConfig,
    symbols: &[String],
    with_ohlc: bool,
    with_verify: bool,
) -> Result<()> {
    let feed = build_feed(config);
    let sink = build_sink(config);
    let store = ProgressStore::new(&config.progress_path);
    let loader = Loader::new(&feed, &sink, &store, config.max_workers, 1);

    let summary = loader.load_latest(symbols, &StdoutLoadProgress);

    if !summary.all_succeeded() {
        for batch in &summary.failed {
            eprintln!("Failed: {batch}");
        }
        std::process::exit(1);
    }

    if with_ohlc || with_verify {
        let query = build_query(config);
        let yesterday = chrono::Utc::now().date_naive() - chrono::Duration::days(1);
        for symbol in symbols {
            if with_ohlc {
                report_ohlc(&query, symbol, yesterday, yesterday);
            }
            if with_verify {
                report_coverage(&query, symbol, yesterday, yesterday)?;
            }
        }
    }

    Ok(())
}

fn run_ohlc(config: &LoaderConfig, symbol: &str, start: &str, end: &str) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    report_ohlc(&build_query(config), symbol, start, end);
    Ok(())
}

fn report_ohlc(query: &StoreQueryClient, symbol: &str, start: NaiveDate, end: NaiveDate) {
    println!("Regenerating OHLC for {symbol} {start} to {end}");
    for result in generate_ohlc(query, symbol, start, end) {
        match result.result {
            Ok(()) => println!("  {:<4} ok", result.timeframe),
            Err(e) => println!("  {:<4} FAILED: {e}", result.timeframe),
        }
    }
}

fn run_verify(config: &LoaderConfig, symbol: &str, start: &str, end: &str) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    report_coverage(&build_query(config), symbol, start, end)
}

fn report_coverage(
    query: &StoreQueryClient,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let coverage = query
        .coverage(symbol, start, end)
        .context("coverage query failed")?;

    println!("Coverage for {symbol} {start} to {end}");
    println!("  Ticks: {}", coverage.tick_count);
    println!("  First: {}", coverage.first.as_deref().unwrap_or("(none)"));
    println!("  Last:  {}", coverage.last.as_deref().unwrap_or("(none)"));

    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    let cache = BlobCache::new(cache_dir);
    let rows = cache.status();

    if rows.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache: {}", cache_dir.display());
    println!("{:<10} {:>8} {:>10}", "Symbol", "Blobs", "Size");
    for row in &rows {
        println!(
            "{:<10} {:>8} {:>10}",
            row.symbol,
            row.blob_count,
            format_size(row.total_bytes)
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
