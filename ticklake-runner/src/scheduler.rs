//! Batch execution: hour tasks on a bounded rayon pool, then one sink call.
//!
//! Every hour task runs Fetch → Decode → Enrich independently; a task
//! failure is caught, logged, and counted — it never cancels its siblings.
//! Decode failures are softer still: the hour simply yields zero records.
//! No ordering is promised across hours; each record carries its own
//! timestamp.

use crate::batch::{expand_hours, Batch, HourTask};
use rayon::prelude::*;
use ticklake_core::decode::decode_hour;
use ticklake_core::enrich::enrich_hour;
use ticklake_core::fetch::TickFeed;
use ticklake_core::sink::IngestionSink;
use ticklake_core::tick::TickRecord;

/// What one hour task produced.
enum HourOutcome {
    Records(Vec<TickRecord>, usize),
    /// No records survived; `rejected` is non-zero when the hour had ticks
    /// but validation dropped them all.
    Empty { rejected: usize },
    DecodeFailed,
    FetchFailed(String),
}

/// Aggregated result of one batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch: Batch,
    pub records: usize,
    pub hours_total: usize,
    pub hours_with_data: usize,
    pub empty_hours: usize,
    pub decode_failures: usize,
    pub rejected_ticks: usize,
    pub task_failures: usize,
    /// Sink failure message, if ingestion did not succeed.
    pub error: Option<String>,
}

impl BatchReport {
    /// A batch completes only when ingestion succeeded and no task failed.
    /// Decode failures and empty hours do not block completion.
    pub fn succeeded(&self) -> bool {
        self.task_failures == 0 && self.error.is_none()
    }
}

/// Run one batch: expand hour tasks, process them with `max_workers`
/// parallelism, and hand all records to the sink as one logical unit.
pub fn run_batch(
    feed: &dyn TickFeed,
    sink: &IngestionSink,
    batch: &Batch,
    max_workers: usize,
) -> BatchReport {
    let tasks = expand_hours(batch);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers.max(1))
        .build()
        .expect("failed to build rayon thread pool");

    let outcomes: Vec<HourOutcome> = pool.install(|| {
        tasks
            .par_iter()
            .map(|task| process_hour(feed, task))
            .collect()
    });

    let mut report = BatchReport {
        batch: batch.clone(),
        records: 0,
        hours_total: tasks.len(),
        hours_with_data: 0,
        empty_hours: 0,
        decode_failures: 0,
        rejected_ticks: 0,
        task_failures: 0,
        error: None,
    };

    let mut records = Vec::new();
    for outcome in outcomes {
        match outcome {
            HourOutcome::Records(mut hour_records, rejected) => {
                report.hours_with_data += 1;
                report.rejected_ticks += rejected;
                records.append(&mut hour_records);
            }
            HourOutcome::Empty { rejected } => {
                report.empty_hours += 1;
                report.rejected_ticks += rejected;
            }
            HourOutcome::DecodeFailed => report.decode_failures += 1,
            HourOutcome::FetchFailed(_) => report.task_failures += 1,
        }
    }

    match sink.ingest(&records) {
        Ok(ingest) => report.records = ingest.rows,
        Err(e) => {
            tracing::error!(batch = %batch, error = %e, "batch ingestion failed");
            report.error = Some(e.to_string());
        }
    }

    report
}

fn process_hour(feed: &dyn TickFeed, task: &HourTask) -> HourOutcome {
    let blob = match feed.fetch_hour(&task.symbol, task.date, task.hour) {
        Ok(Some(blob)) => blob,
        Ok(None) => return HourOutcome::Empty { rejected: 0 },
        Err(e) => {
            tracing::warn!(
                symbol = %task.symbol,
                date = %task.date,
                hour = task.hour,
                error = %e,
                "hour fetch failed"
            );
            return HourOutcome::FetchFailed(e.to_string());
        }
    };

    let ticks = match decode_hour(&blob) {
        Ok(ticks) => ticks,
        Err(e) => {
            tracing::warn!(
                symbol = %task.symbol,
                date = %task.date,
                hour = task.hour,
                error = %e,
                "decode failed, hour yields no records"
            );
            return HourOutcome::DecodeFailed;
        }
    };

    let outcome = enrich_hour(&task.symbol, task.date, task.hour, &ticks);
    if outcome.records.is_empty() {
        HourOutcome::Empty {
            rejected: outcome.rejected,
        }
    } else {
        HourOutcome::Records(outcome.records, outcome.rejected)
    }
}
