//! Read-only store query client.
//!
//! Talks to the store's SQL-over-HTTP endpoint (`GET /exec?query=...`).
//! Used only to check existing coverage around a run and to issue the
//! candle regeneration statements — never for tick inserts, which go
//! through the ILP sink.

use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

/// Table holding enriched tick records.
pub const TICK_TABLE: &str = "market_data_v2";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("store unreachable: {0}")]
    Http(String),

    #[error("store returned HTTP {0}")]
    Status(String),

    #[error("store rejected query: {0}")]
    Store(String),

    #[error("unexpected response shape: {0}")]
    Format(String),
}

/// Raw `/exec` response. The store reports errors in-band.
#[derive(Debug, Deserialize)]
pub struct ExecResponse {
    #[serde(default)]
    pub dataset: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Store-side coverage of a symbol over a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub tick_count: u64,
    pub first: Option<String>,
    pub last: Option<String>,
}

pub struct StoreQueryClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl StoreQueryClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Execute one SQL statement, surfacing in-band store errors.
    pub fn exec(&self, sql: &str) -> Result<ExecResponse, QueryError> {
        let resp = self
            .client
            .get(format!("{}/exec", self.base_url))
            .query(&[("query", sql)])
            .send()
            .map_err(|e| QueryError::Http(e.to_string()))?;

        let status = resp.status();
        let body: ExecResponse = resp
            .json()
            .map_err(|e| QueryError::Format(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(QueryError::Store(err));
        }
        if !status.is_success() {
            return Err(QueryError::Status(status.to_string()));
        }

        Ok(body)
    }

    /// Min/max timestamp and tick count for a symbol over `[start, end]`
    /// (inclusive days).
    pub fn coverage(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Coverage, QueryError> {
        let sql = coverage_sql(symbol, start, end);
        let resp = self.exec(&sql)?;
        parse_coverage(&resp)
    }
}

fn coverage_sql(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    let upper = end + Duration::days(1);
    format!(
        "SELECT count(), min(timestamp), max(timestamp) FROM {TICK_TABLE} \
         WHERE symbol = '{}' AND timestamp >= '{start}' AND timestamp < '{upper}'",
        escape_sql_literal(symbol)
    )
}

fn parse_coverage(resp: &ExecResponse) -> Result<Coverage, QueryError> {
    let row = resp
        .dataset
        .first()
        .ok_or_else(|| QueryError::Format("empty dataset".to_string()))?;

    let tick_count = row
        .first()
        .and_then(|v| v.as_u64())
        .ok_or_else(|| QueryError::Format("count column is not a number".to_string()))?;

    let ts = |idx: usize| row.get(idx).and_then(|v| v.as_str()).map(str::to_string);

    Ok(Coverage {
        tick_count,
        first: ts(1),
        last: ts(2),
    })
}

/// Double single quotes so a symbol can never break out of the literal.
fn escape_sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}
