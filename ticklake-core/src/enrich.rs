//! Record enrichment: raw ticks + hour context into validated tick records.
//!
//! The enricher is the single place the bid/ask sanity check happens.
//! Violators (`bid <= 0`, `ask <= 0`, `bid >= ask`) are dropped and counted,
//! never logged per record — a noisy vendor hour would otherwise flood the
//! logs.

use crate::calendar::{is_market_open, session_for_hour};
use crate::tick::{RawTick, TickRecord};
use chrono::{Datelike, Duration, NaiveDate, Timelike};

/// Result of enriching one hour: records plus the rejected-tick count.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub records: Vec<TickRecord>,
    pub rejected: usize,
}

/// Enrich one hour of raw ticks.
///
/// Absolute timestamp = `date + hour` (UTC) + the tick's millisecond offset.
/// Session and market-open are derived from the tick's own timestamp, so an
/// offset that crosses the hour boundary classifies correctly.
pub fn enrich_hour(symbol: &str, date: NaiveDate, hour: u8, ticks: &[RawTick]) -> EnrichOutcome {
    let base = match date.and_hms_opt(u32::from(hour), 0, 0) {
        Some(dt) => dt.and_utc(),
        None => return EnrichOutcome::default(), // hour out of range
    };

    let mut out = EnrichOutcome {
        records: Vec::with_capacity(ticks.len()),
        rejected: 0,
    };

    for tick in ticks {
        let bid = tick.bid();
        let ask = tick.ask();

        if bid <= 0.0 || ask <= 0.0 || bid >= ask {
            out.rejected += 1;
            continue;
        }

        let timestamp = base + Duration::milliseconds(i64::from(tick.time_offset_ms));
        let hour_of_day = timestamp.hour() as u8;
        let day_of_week = timestamp.weekday().number_from_monday() as u8;
        let bid_volume = f64::from(tick.bid_volume);
        let ask_volume = f64::from(tick.ask_volume);

        out.records.push(TickRecord {
            timestamp,
            symbol: symbol.to_string(),
            bid,
            ask,
            price: (bid + ask) / 2.0,
            spread: ask - bid,
            volume: bid_volume + ask_volume,
            bid_volume,
            ask_volume,
            hour_of_day,
            day_of_week,
            session: session_for_hour(hour_of_day),
            market_open: is_market_open(hour_of_day, day_of_week),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Session;

    fn raw(offset: u32, ask: u32, bid: u32) -> RawTick {
        RawTick {
            time_offset_ms: offset,
            ask_scaled: ask,
            bid_scaled: bid,
            ask_volume: 1.0,
            bid_volume: 2.0,
        }
    }

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 19).unwrap()
    }

    #[test]
    fn valid_tick_derives_exact_mid_and_spread() {
        let out = enrich_hour("EURUSD", friday(), 10, &[raw(500, 108_830, 108_820)]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.rejected, 0);

        let rec = out.records[0].clone();
        assert_eq!(rec.bid, 1.0882);
        assert_eq!(rec.ask, 1.0883);
        assert_eq!(rec.price, (rec.bid + rec.ask) / 2.0);
        assert_eq!(rec.spread, rec.ask - rec.bid);
        assert_eq!(rec.volume, 3.0);
        assert_eq!(rec.timestamp.to_rfc3339(), "2024-01-19T10:00:00.500+00:00");
        assert_eq!(rec.hour_of_day, 10);
        assert_eq!(rec.day_of_week, 5);
        assert_eq!(rec.session, Session::London);
        assert!(rec.market_open);
    }

    #[test]
    fn zero_bid_is_dropped() {
        let out = enrich_hour("EURUSD", friday(), 10, &[raw(0, 108_830, 0)]);
        assert!(out.records.is_empty());
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn crossed_and_equal_quotes_are_dropped() {
        let crossed = raw(0, 108_820, 108_830); // bid > ask
        let locked = raw(0, 108_825, 108_825); // bid == ask
        let out = enrich_hour("EURUSD", friday(), 10, &[crossed, locked]);
        assert!(out.records.is_empty());
        assert_eq!(out.rejected, 2);
    }

    #[test]
    fn drops_are_counted_alongside_kept_records() {
        let out = enrich_hour(
            "EURUSD",
            friday(),
            10,
            &[raw(0, 108_830, 108_820), raw(1, 108_830, 0), raw(2, 108_831, 108_821)],
        );
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn offset_crossing_hour_boundary_reclassifies() {
        // Hour 21 blob, offset pushes the tick into hour 22 — Friday 22:00
        // is past the close.
        let out = enrich_hour("EURUSD", friday(), 21, &[raw(3_600_500, 108_830, 108_820)]);
        let rec = &out.records[0];
        assert_eq!(rec.hour_of_day, 22);
        assert_eq!(rec.session, Session::Sydney);
        assert!(!rec.market_open);
    }

    #[test]
    fn output_never_longer_than_input() {
        let ticks: Vec<RawTick> = (0..50).map(|i| raw(i, 108_830, 108_820)).collect();
        let out = enrich_hour("EURUSD", friday(), 3, &ticks);
        assert!(out.records.len() <= ticks.len());
    }
}
