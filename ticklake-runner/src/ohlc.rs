//! Candle regeneration: server-side downsampling of the tick table.
//!
//! The store aggregates ticks into one candle table per timeframe with a
//! single `INSERT INTO ... SELECT ... SAMPLE BY` statement, so no tick data
//! crosses the wire. A failed timeframe is reported and the rest still run.

use chrono::{Duration, NaiveDate};
use ticklake_core::query::{QueryError, StoreQueryClient, TICK_TABLE};

/// Timeframes regenerated after a load, coarsest last.
pub const OHLC_TIMEFRAMES: [&str; 7] = ["1m", "5m", "15m", "30m", "1h", "4h", "1d"];

/// Result of regenerating one timeframe.
#[derive(Debug)]
pub struct OhlcResult {
    pub timeframe: &'static str,
    pub result: Result<(), QueryError>,
}

/// Regenerate candles for every timeframe over `[start, end]` (inclusive
/// days). Zero-volume ticks are excluded so indicative weekend quotes never
/// distort candles.
pub fn generate_ohlc(
    query: &StoreQueryClient,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<OhlcResult> {
    OHLC_TIMEFRAMES
        .iter()
        .map(|tf| {
            let sql = ohlc_sql(tf, symbol, start, end);
            let result = query.exec(&sql).map(|_| ());
            match &result {
                Ok(()) => tracing::info!(symbol, timeframe = tf, "candles regenerated"),
                Err(e) => {
                    tracing::warn!(symbol, timeframe = tf, error = %e, "candle regeneration failed")
                }
            }
            OhlcResult {
                timeframe: tf,
                result,
            }
        })
        .collect()
}

fn ohlc_sql(timeframe: &str, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    let upper = end + Duration::days(1);
    let symbol = symbol.replace('\'', "''");
    format!(
        "INSERT INTO ohlc_{timeframe}_v2 \
         SELECT timestamp, symbol, \
         first(price) AS open, max(price) AS high, min(price) AS low, last(price) AS close, \
         sum(volume) AS volume, count() AS tick_count, \
         sum(price * volume) / sum(volume) AS vwap, \
         first(trading_session) AS trading_session \
         FROM {TICK_TABLE} \
         WHERE symbol = '{symbol}' \
         AND timestamp >= '{start}' AND timestamp < '{upper}' \
         AND volume > 0 \
         SAMPLE BY {timeframe} ALIGN TO CALENDAR"
    )
}
