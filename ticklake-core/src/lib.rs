//! TickLake Core — the leaf components of the tick ingestion pipeline.
//!
//! This crate contains everything below the batch orchestration layer:
//! - Domain types ([`RawTick`], [`TickRecord`])
//! - Vendor blob decoding (LZMA + fixed 20-byte records)
//! - Market calendar (session bands, open/closed schedule)
//! - Record enrichment and validation
//! - Vendor archive client, on-disk blob cache, and the combined fetch client
//! - Shared bounded retry policy
//! - ILP batch builder and the chunked ingestion sink
//! - Read-only store query client for coverage checks

pub mod archive;
pub mod cache;
pub mod calendar;
pub mod decode;
pub mod enrich;
pub mod fetch;
pub mod ilp;
pub mod query;
pub mod retry;
pub mod sink;
pub mod tick;

pub use archive::{ArchiveClient, ArchiveSource, FeedError};
pub use cache::{BlobCache, CacheError};
pub use calendar::{is_market_open, session_for_hour, Session};
pub use decode::{decode_hour, DecodeError};
pub use enrich::{enrich_hour, EnrichOutcome};
pub use fetch::{FetchClient, TickFeed};
pub use ilp::IlpBuffer;
pub use query::{Coverage, QueryError, StoreQueryClient};
pub use retry::RetryPolicy;
pub use sink::{BulkSink, IlpTcpSink, IngestReport, IngestionSink, SinkError};
pub use tick::{RawTick, TickRecord};
