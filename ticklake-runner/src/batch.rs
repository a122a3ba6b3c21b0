//! Batch planning: date-range partitioning and hour-task expansion.

use crate::progress;
use chrono::{Datelike, Duration, NaiveDate};
use ticklake_core::calendar::is_market_open;

/// A contiguous multi-day unit of work, tracked for resumability.
/// `start..=end` inclusive; the final batch of a range may be shorter than
/// the configured `batch_days`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Batch {
    /// Versioned progress key for this batch.
    pub fn key(&self) -> String {
        progress::batch_key(&self.symbol, self.start, self.end)
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} to {}", self.symbol, self.start, self.end)
    }
}

/// One hour of fetch/decode/enrich work. Discarded after completion or
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourTask {
    pub symbol: String,
    pub date: NaiveDate,
    pub hour: u8,
}

/// Partition `[start, end]` (inclusive days) into consecutive
/// `batch_days`-day batches.
pub fn plan_batches(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    batch_days: u32,
) -> Vec<Batch> {
    let batch_days = i64::from(batch_days.max(1));
    let mut batches = Vec::new();
    let mut current = start;

    while current <= end {
        let batch_end = (current + Duration::days(batch_days - 1)).min(end);
        batches.push(Batch {
            symbol: symbol.to_string(),
            start: current,
            end: batch_end,
        });
        current = batch_end + Duration::days(1);
    }

    batches
}

/// Expand a batch into hour tasks, skipping hours the market is closed.
///
/// The skip is a fetch-avoidance optimization, not a correctness
/// requirement — the fetch client already answers "no data" gracefully for
/// hours the vendor has nothing for.
pub fn expand_hours(batch: &Batch) -> Vec<HourTask> {
    let mut tasks = Vec::new();
    let mut date = batch.start;

    while date <= batch.end {
        let weekday = date.weekday().number_from_monday() as u8;
        for hour in 0..24u8 {
            if is_market_open(hour, weekday) {
                tasks.push(HourTask {
                    symbol: batch.symbol.clone(),
                    date,
                    hour,
                });
            }
        }
        date += Duration::days(1);
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn partitions_into_consecutive_windows() {
        let batches = plan_batches("EURUSD", date(1, 1), date(1, 10), 3);
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].start, date(1, 1));
        assert_eq!(batches[0].end, date(1, 3));
        assert_eq!(batches[1].start, date(1, 4));
        assert_eq!(batches[2].end, date(1, 9));
        // Final batch is shorter.
        assert_eq!(batches[3].start, date(1, 10));
        assert_eq!(batches[3].end, date(1, 10));
        assert_eq!(batches[3].days(), 1);
    }

    #[test]
    fn single_day_range_is_one_batch() {
        let batches = plan_batches("EURUSD", date(1, 5), date(1, 5), 3);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].days(), 1);
    }

    #[test]
    fn weekend_hours_are_skipped() {
        // 2024-01-19 is a Friday, 01-20 Saturday, 01-21 Sunday.
        let batch = Batch {
            symbol: "EURUSD".to_string(),
            start: date(1, 19),
            end: date(1, 21),
        };
        let tasks = expand_hours(&batch);

        // Friday: open until 22:00 → hours 0-21.
        let friday: Vec<u8> = tasks
            .iter()
            .filter(|t| t.date == date(1, 19))
            .map(|t| t.hour)
            .collect();
        assert_eq!(friday, (0..22).collect::<Vec<u8>>());

        // Saturday: fully closed.
        assert!(!tasks.iter().any(|t| t.date == date(1, 20)));

        // Sunday: reopens at 22:00 → hours 22 and 23 only.
        let sunday: Vec<u8> = tasks
            .iter()
            .filter(|t| t.date == date(1, 21))
            .map(|t| t.hour)
            .collect();
        assert_eq!(sunday, vec![22, 23]);
    }

    #[test]
    fn midweek_day_expands_all_24_hours() {
        let batch = Batch {
            symbol: "EURUSD".to_string(),
            start: date(1, 17), // Wednesday
            end: date(1, 17),
        };
        assert_eq!(expand_hours(&batch).len(), 24);
    }
}
