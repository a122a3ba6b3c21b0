//! Ingestion sink: chunked, retried bulk writes to the time-series store.
//!
//! Records are grouped into fixed-size chunks bounded by the store's
//! request-size limits and written sequentially. Each chunk write retries
//! under the shared [`RetryPolicy`]; exhausting the budget fails the whole
//! sink call, and therefore the enclosing batch. The sink performs no
//! deduplication — overlapping writes rely on the store's own semantics.

use crate::ilp::{IlpBuffer, IlpError};
use crate::retry::RetryPolicy;
use crate::tick::TickRecord;
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("ilp connect failed: {0}")]
    Connect(String),

    #[error("ilp write failed: {0}")]
    Write(String),

    #[error(transparent)]
    Encode(#[from] IlpError),
}

impl SinkError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SinkError::Connect(_) | SinkError::Write(_))
    }
}

/// One bulk-insert call: a single chunk of records to the store.
pub trait BulkSink: Send + Sync {
    fn send_chunk(&self, records: &[TickRecord]) -> Result<(), SinkError>;
}

/// ILP-over-TCP bulk sink (QuestDB's line protocol port).
///
/// Connects per chunk; the store end multiplexes writers, so concurrent
/// runs sharing the port are tolerated.
pub struct IlpTcpSink {
    addr: String,
    table: String,
    write_timeout: Duration,
}

impl IlpTcpSink {
    pub fn new(addr: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            table: table.into(),
            write_timeout: Duration::from_secs(30),
        }
    }
}

impl BulkSink for IlpTcpSink {
    fn send_chunk(&self, records: &[TickRecord]) -> Result<(), SinkError> {
        let mut buf = IlpBuffer::new(&self.table, records.len().max(1));
        for rec in records {
            buf.push(rec)?;
        }

        let mut stream =
            TcpStream::connect(&self.addr).map_err(|e| SinkError::Connect(e.to_string()))?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        stream
            .write_all(buf.as_str().as_bytes())
            .map_err(|e| SinkError::Write(e.to_string()))?;
        stream.flush().map_err(|e| SinkError::Write(e.to_string()))?;

        Ok(())
    }
}

/// Outcome of a successful sink call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub rows: usize,
    pub chunks: usize,
}

/// Chunking + retry wrapper around a [`BulkSink`].
pub struct IngestionSink {
    sink: Box<dyn BulkSink>,
    chunk_size: usize,
    retry: RetryPolicy,
}

impl IngestionSink {
    pub fn new(sink: Box<dyn BulkSink>, chunk_size: usize, retry: RetryPolicy) -> Self {
        Self {
            sink,
            chunk_size: chunk_size.max(1),
            retry,
        }
    }

    /// Write all records as sequential bounded chunks. Zero-length input is
    /// a no-op success.
    pub fn ingest(&self, records: &[TickRecord]) -> Result<IngestReport, SinkError> {
        if records.is_empty() {
            return Ok(IngestReport::default());
        }

        let mut chunks = 0;
        for chunk in records.chunks(self.chunk_size) {
            self.retry
                .run(|| self.sink.send_chunk(chunk), SinkError::is_transient)?;
            chunks += 1;
        }

        tracing::debug!(rows = records.len(), chunks, "bulk insert complete");
        Ok(IngestReport {
            rows: records.len(),
            chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Session;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn records(n: usize) -> Vec<TickRecord> {
        (0..n)
            .map(|i| TickRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 19, 10, 0, 0).unwrap()
                    + chrono::Duration::milliseconds(i as i64),
                symbol: "EURUSD".to_string(),
                bid: 1.08823,
                ask: 1.08825,
                price: 1.08824,
                spread: 2e-5,
                volume: 2.0,
                bid_volume: 1.0,
                ask_volume: 1.0,
                hour_of_day: 10,
                day_of_week: 5,
                session: Session::London,
                market_open: true,
            })
            .collect()
    }

    struct CountingSink {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
    }

    impl BulkSink for CountingSink {
        fn send_chunk(&self, _records: &[TickRecord]) -> Result<(), SinkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(SinkError::Write("store unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn instant_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn twenty_five_hundred_records_at_bound_1000_is_three_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = IngestionSink::new(
            Box::new(CountingSink {
                calls: Arc::clone(&calls),
                fail_first: 0,
            }),
            1000,
            instant_retry(3),
        );

        let report = sink.ingest(&records(2500)).unwrap();
        assert_eq!(report.chunks, 3);
        assert_eq!(report.rows, 2500);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_input_is_noop_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = IngestionSink::new(
            Box::new(CountingSink {
                calls: Arc::clone(&calls),
                fail_first: 0,
            }),
            1000,
            instant_retry(3),
        );

        let report = sink.ingest(&[]).unwrap();
        assert_eq!(report, IngestReport::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transient_chunk_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = IngestionSink::new(
            Box::new(CountingSink {
                calls: Arc::clone(&calls),
                fail_first: 2,
            }),
            1000,
            instant_retry(3),
        );

        let report = sink.ingest(&records(10)).unwrap();
        assert_eq!(report.chunks, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retry_exhaustion_fails_the_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = IngestionSink::new(
            Box::new(CountingSink {
                calls: Arc::clone(&calls),
                fail_first: usize::MAX,
            }),
            1000,
            instant_retry(3),
        );

        assert!(sink.ingest(&records(10)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
