//! Domain types: raw vendor ticks and enriched tick records.

use crate::calendar::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vendor prices are stored as integers scaled by 10^5.
pub const PRICE_SCALE: f64 = 100_000.0;

/// One decoded 20-byte archive record, exactly as the vendor stores it.
///
/// Ephemeral: produced by the decoder, consumed by the enricher, never
/// persisted. No validation has happened at this stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTick {
    /// Milliseconds since the start of the containing hour.
    pub time_offset_ms: u32,
    pub ask_scaled: u32,
    pub bid_scaled: u32,
    pub ask_volume: f32,
    pub bid_volume: f32,
}

impl RawTick {
    pub fn bid(&self) -> f64 {
        f64::from(self.bid_scaled) / PRICE_SCALE
    }

    pub fn ask(&self) -> f64 {
        f64::from(self.ask_scaled) / PRICE_SCALE
    }
}

/// A validated, enriched tick ready for the ingestion sink.
///
/// Invariant: `bid > 0`, `ask > 0`, `bid < ask`. Ticks violating this are
/// dropped during enrichment and never reach the store. Immutable once
/// created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// UTC timestamp with millisecond precision.
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    /// Mid price: `(bid + ask) / 2`.
    pub price: f64,
    /// `ask - bid`.
    pub spread: f64,
    /// `bid_volume + ask_volume`.
    pub volume: f64,
    pub bid_volume: f64,
    pub ask_volume: f64,
    pub hour_of_day: u8,
    /// ISO weekday: Monday = 1 … Sunday = 7.
    pub day_of_week: u8,
    pub session: Session,
    pub market_open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_prices_divide_by_100000() {
        let tick = RawTick {
            time_offset_ms: 0,
            ask_scaled: 108_825,
            bid_scaled: 108_823,
            ask_volume: 1.0,
            bid_volume: 1.0,
        };
        assert_eq!(tick.ask(), 1.08825);
        assert_eq!(tick.bid(), 1.08823);
    }
}
