//! ILP (InfluxDB line protocol) batch builder.
//!
//! One `TickRecord` becomes one line:
//!
//! ```text
//! market_data_v2,symbol=EURUSD bid=1.08823,ask=1.08825,...,market_open=t 1705658400000000000
//! ```
//!
//! The buffer is the parameterized replacement for string-concatenated
//! insert payloads: escaping happens at construction time and the chunk
//! bound is enforced by `push`, so an oversized batch cannot be built at
//! all.

use crate::tick::TickRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IlpError {
    #[error("chunk bound exceeded ({max_rows} rows)")]
    ChunkFull { max_rows: usize },
}

/// Append-only buffer of encoded ILP rows with a hard row bound.
pub struct IlpBuffer {
    table: String,
    buf: String,
    rows: usize,
    max_rows: usize,
}

impl IlpBuffer {
    pub fn new(table: &str, max_rows: usize) -> Self {
        Self {
            table: escape_tag(table),
            buf: String::new(),
            rows: 0,
            max_rows: max_rows.max(1),
        }
    }

    /// Encode one record into the buffer. Fails once the chunk bound is
    /// reached.
    pub fn push(&mut self, rec: &TickRecord) -> Result<(), IlpError> {
        if self.rows >= self.max_rows {
            return Err(IlpError::ChunkFull {
                max_rows: self.max_rows,
            });
        }

        let timestamp_ns = rec.timestamp.timestamp_millis() * 1_000_000;
        self.buf.push_str(&format!(
            "{table},symbol={symbol} bid={bid},ask={ask},price={price},spread={spread},\
             volume={volume},bid_volume={bid_volume},ask_volume={ask_volume},\
             hour_of_day={hour}i,day_of_week={dow}i,\
             trading_session=\"{session}\",market_open={open} {timestamp_ns}\n",
            table = self.table,
            symbol = escape_tag(&rec.symbol),
            bid = rec.bid,
            ask = rec.ask,
            price = rec.price,
            spread = rec.spread,
            volume = rec.volume,
            bid_volume = rec.bid_volume,
            ask_volume = rec.ask_volume,
            hour = rec.hour_of_day,
            dow = rec.day_of_week,
            session = escape_field_string(rec.session.as_str()),
            open = if rec.market_open { "t" } else { "f" },
        ));

        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The encoded payload, one line per row.
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

/// Escape an ILP tag or measurement value: comma, space, equals.
fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an ILP string field value: backslash and double quote.
fn escape_field_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Session;
    use chrono::{TimeZone, Utc};

    fn record() -> TickRecord {
        TickRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 19, 10, 0, 0).unwrap(),
            symbol: "EURUSD".to_string(),
            bid: 1.08823,
            ask: 1.08825,
            price: 1.08824,
            spread: 2e-5,
            volume: 3.0,
            bid_volume: 2.0,
            ask_volume: 1.0,
            hour_of_day: 10,
            day_of_week: 5,
            session: Session::London,
            market_open: true,
        }
    }

    #[test]
    fn encodes_one_row_per_record() {
        let mut buf = IlpBuffer::new("market_data_v2", 10);
        buf.push(&record()).unwrap();

        let line = buf.as_str();
        assert!(line.starts_with("market_data_v2,symbol=EURUSD "));
        assert!(line.contains("bid=1.08823"));
        assert!(line.contains("ask=1.08825"));
        assert!(line.contains("hour_of_day=10i"));
        assert!(line.contains("day_of_week=5i"));
        assert!(line.contains("trading_session=\"LONDON\""));
        assert!(line.contains("market_open=t "));
        assert!(line.ends_with("1705658400000000000\n"));
        assert_eq!(buf.rows(), 1);
    }

    #[test]
    fn chunk_bound_is_enforced_at_push() {
        let mut buf = IlpBuffer::new("market_data_v2", 2);
        buf.push(&record()).unwrap();
        buf.push(&record()).unwrap();
        assert!(matches!(
            buf.push(&record()),
            Err(IlpError::ChunkFull { max_rows: 2 })
        ));
        assert_eq!(buf.rows(), 2);
    }

    #[test]
    fn tag_values_are_escaped() {
        assert_eq!(escape_tag("EUR USD,x=y"), "EUR\\ USD\\,x\\=y");
    }

    #[test]
    fn string_fields_are_escaped() {
        assert_eq!(escape_field_string(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn millisecond_precision_survives() {
        let mut rec = record();
        rec.timestamp = Utc.with_ymd_and_hms(2024, 1, 19, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        let mut buf = IlpBuffer::new("market_data_v2", 1);
        buf.push(&rec).unwrap();
        assert!(buf.as_str().ends_with("1705658400123000000\n"));
    }
}
