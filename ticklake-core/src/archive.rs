//! Vendor archive client.
//!
//! The archive serves one hour of tick data per URL:
//!
//! ```text
//! GET {base}/{symbol}/{year}/{month0:02}/{day:02}/{hour:02}h_ticks.bi5
//! ```
//!
//! with a zero-based month. A non-success status or an empty body means the
//! vendor has no data for that hour (weekends, holidays, gaps) — that is a
//! legitimate answer, not an error. A multi-year backfill issues tens of
//! thousands of these requests, so the client keeps one pooled
//! `reqwest::blocking::Client` for its whole lifetime.

use crate::retry::RetryPolicy;
use chrono::{Datelike, NaiveDate};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

impl FeedError {
    /// Transient errors are worth another attempt under the retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::NetworkUnreachable(_) | FeedError::Timeout(_))
    }
}

/// Remote source of compressed hour blobs. `Ok(None)` means the vendor has
/// no data for that hour. The seam the fetch client's cache sits in front
/// of, so tests can count archive hits.
pub trait ArchiveSource: Send + Sync {
    fn fetch_hour(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Option<Vec<u8>>, FeedError>;
}

/// HTTP client for the vendor's compressed tick archive.
pub struct ArchiveClient {
    client: reqwest::blocking::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ArchiveClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Archive URL for one (symbol, date, hour). The vendor uses zero-based
    /// months.
    fn hour_url(&self, symbol: &str, date: NaiveDate, hour: u8) -> String {
        format!(
            "{}/{}/{}/{:02}/{:02}/{:02}h_ticks.bi5",
            self.base_url,
            symbol,
            date.year(),
            date.month0(),
            date.day(),
            hour
        )
    }
}

impl ArchiveSource for ArchiveClient {
    fn fetch_hour(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Option<Vec<u8>>, FeedError> {
        let url = self.hour_url(symbol, date, hour);

        self.retry.run(
            || {
                let resp = self.client.get(&url).send().map_err(|e| {
                    if e.is_timeout() {
                        FeedError::Timeout(e.to_string())
                    } else {
                        FeedError::NetworkUnreachable(e.to_string())
                    }
                })?;

                if !resp.status().is_success() {
                    tracing::debug!(%url, status = %resp.status(), "no archive data for hour");
                    return Ok(None);
                }

                let body = resp.bytes().map_err(|e| FeedError::Body(e.to_string()))?;
                if body.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(body.to_vec()))
                }
            },
            FeedError::is_transient,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ArchiveClient {
        ArchiveClient::new(
            "https://datafeed.example.com/datafeed/",
            Duration::from_secs(30),
            RetryPolicy::default(),
        )
    }

    #[test]
    fn url_uses_zero_based_month() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        assert_eq!(
            client().hour_url("EURUSD", date, 7),
            "https://datafeed.example.com/datafeed/EURUSD/2024/00/19/07h_ticks.bi5"
        );
    }

    #[test]
    fn url_pads_day_and_hour() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 5).unwrap();
        assert_eq!(
            client().hour_url("GBPUSD", date, 23),
            "https://datafeed.example.com/datafeed/GBPUSD/2023/11/05/23h_ticks.bi5"
        );
    }
}
