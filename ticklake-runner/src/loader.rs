//! Range orchestrator: sequential resumable batches over a parallel core.
//!
//! Batches run one after another so progress advances monotonically through
//! time; within a batch, hour tasks fan out on the rayon pool. Progress is
//! persisted immediately after each successful batch, so a crash between
//! batches loses at most the batch in flight.

use crate::batch::{plan_batches, Batch};
use crate::progress::ProgressStore;
use crate::scheduler::{run_batch, BatchReport};
use chrono::{Duration, Utc};
use ticklake_core::fetch::TickFeed;
use ticklake_core::sink::IngestionSink;

/// Per-batch notifications for whatever front end is driving the run.
pub trait LoadProgress {
    fn on_batch_start(&self, index: usize, total: usize, batch: &Batch);
    fn on_batch_skipped(&self, index: usize, total: usize, batch: &Batch);
    fn on_batch_complete(&self, index: usize, total: usize, report: &BatchReport);
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Plain-stdout progress reporter for CLI runs.
pub struct StdoutLoadProgress;

impl LoadProgress for StdoutLoadProgress {
    fn on_batch_start(&self, index: usize, total: usize, batch: &Batch) {
        println!("[{}/{}] loading {batch}", index + 1, total);
    }

    fn on_batch_skipped(&self, index: usize, total: usize, batch: &Batch) {
        println!("[{}/{}] {batch} already complete, skipping", index + 1, total);
    }

    fn on_batch_complete(&self, index: usize, total: usize, report: &BatchReport) {
        if report.succeeded() {
            println!(
                "[{}/{}] {} done: {} records ({} hours with data, {} empty, {} decode failures, {} rejected ticks)",
                index + 1,
                total,
                report.batch,
                report.records,
                report.hours_with_data,
                report.empty_hours,
                report.decode_failures,
                report.rejected_ticks,
            );
        } else {
            println!(
                "[{}/{}] {} FAILED: {}",
                index + 1,
                total,
                report.batch,
                report
                    .error
                    .as_deref()
                    .unwrap_or("one or more hour tasks failed"),
            );
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!(
            "run finished: {} records, {} batches completed, {} skipped, {} failed",
            summary.records,
            summary.batches_completed,
            summary.batches_skipped,
            summary.failed.len(),
        );
    }
}

/// Aggregate result of a full range load.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub records: usize,
    pub rejected_ticks: usize,
    pub decode_failures: usize,
    pub batches_completed: usize,
    pub batches_skipped: usize,
    /// Batches that failed and were left out of the progress file.
    pub failed: Vec<Batch>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    fn absorb(&mut self, report: &BatchReport) {
        // Diagnostics count either way; a failed batch still saw its hours.
        self.rejected_ticks += report.rejected_ticks;
        self.decode_failures += report.decode_failures;

        if report.succeeded() {
            self.records += report.records;
            self.batches_completed += 1;
        } else {
            self.failed.push(report.batch.clone());
        }
    }
}

/// Drives resumable range loads against a feed and a sink.
pub struct Loader<'a> {
    feed: &'a dyn TickFeed,
    sink: &'a IngestionSink,
    progress_store: &'a ProgressStore,
    max_workers: usize,
    batch_days: u32,
}

impl<'a> Loader<'a> {
    pub fn new(
        feed: &'a dyn TickFeed,
        sink: &'a IngestionSink,
        progress_store: &'a ProgressStore,
        max_workers: usize,
        batch_days: u32,
    ) -> Self {
        Self {
            feed,
            sink,
            progress_store,
            max_workers,
            batch_days,
        }
    }

    /// Load `[start, end]` for one symbol, skipping batches already recorded
    /// as complete unless `force` is set. A failed batch is reported and the
    /// run continues with the next one; its progress key is left absent so a
    /// re-run retries exactly the failed work.
    pub fn load_range(
        &self,
        symbol: &str,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        force: bool,
        progress: &dyn LoadProgress,
    ) -> RunSummary {
        let batches = plan_batches(symbol, start, end, self.batch_days);
        let total = batches.len();
        let mut map = self.progress_store.load();
        let mut summary = RunSummary::default();

        for (index, batch) in batches.iter().enumerate() {
            if !force && ProgressStore::is_complete(&map, batch) {
                progress.on_batch_skipped(index, total, batch);
                summary.batches_skipped += 1;
                continue;
            }

            progress.on_batch_start(index, total, batch);
            let report = run_batch(self.feed, self.sink, batch, self.max_workers);

            if report.succeeded() {
                ProgressStore::mark_complete(&mut map, batch);
                if let Err(e) = self.progress_store.save(&map) {
                    // The batch still completed; only resumability is degraded.
                    tracing::error!(batch = %batch, error = %e, "failed to persist progress");
                }
            }

            summary.absorb(&report);
            progress.on_batch_complete(index, total, &report);
        }

        progress.on_run_complete(&summary);
        summary
    }

    /// Load yesterday (UTC) for each symbol as a single one-day batch.
    /// Yesterday rather than today: today's hour blobs are still being
    /// written on the vendor side.
    pub fn load_latest(&self, symbols: &[String], progress: &dyn LoadProgress) -> RunSummary {
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let mut summary = RunSummary::default();

        for symbol in symbols {
            let run = self.load_range(symbol, yesterday, yesterday, false, progress);
            summary.records += run.records;
            summary.rejected_ticks += run.rejected_ticks;
            summary.decode_failures += run.decode_failures;
            summary.batches_completed += run.batches_completed;
            summary.batches_skipped += run.batches_skipped;
            summary.failed.extend(run.failed);
        }

        summary
    }
}

/// Reporter that swallows all notifications. Useful in tests and embedding.
pub struct SilentLoadProgress;

impl LoadProgress for SilentLoadProgress {
    fn on_batch_start(&self, _index: usize, _total: usize, _batch: &Batch) {}
    fn on_batch_skipped(&self, _index: usize, _total: usize, _batch: &Batch) {}
    fn on_batch_complete(&self, _index: usize, _total: usize, _report: &BatchReport) {}
    fn on_run_complete(&self, _summary: &RunSummary) {}
}
