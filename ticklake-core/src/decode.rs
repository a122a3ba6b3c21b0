//! Vendor blob decoder: LZMA decompression + fixed-width record parsing.
//!
//! One hour of archive data is a single LZMA-compressed blob of consecutive
//! 20-byte big-endian records:
//!
//! ```text
//! u32 time-offset-ms | u32 ask x 100000 | u32 bid x 100000 | f32 ask-vol | f32 bid-vol
//! ```
//!
//! Decoding is stateless: the sequence is recomputed from the blob on every
//! call. A trailing partial record is silently discarded. No value
//! validation happens here — that is the enricher's job.

use crate::tick::RawTick;
use std::io::Cursor;
use thiserror::Error;

/// Fixed size of one archive tick record in bytes.
pub const TICK_RECORD_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("lzma decompression failed: {0}")]
    Decompress(String),
}

/// Decode one hour's compressed blob into raw ticks.
///
/// An empty blob yields an empty vec. Decompression failure is an error the
/// caller is expected to log and treat as "zero ticks this hour" — one
/// corrupt hour must never abort a range load.
pub fn decode_hour(blob: &[u8]) -> Result<Vec<RawTick>, DecodeError> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }

    let mut decompressed = Vec::new();
    lzma_rs::lzma_decompress(&mut Cursor::new(blob), &mut decompressed)
        .map_err(|e| DecodeError::Decompress(format!("{e:?}")))?;

    Ok(parse_ticks(&decompressed))
}

fn parse_ticks(bytes: &[u8]) -> Vec<RawTick> {
    let mut ticks = Vec::with_capacity(bytes.len() / TICK_RECORD_LEN);

    // chunks_exact drops a trailing partial record.
    for rec in bytes.chunks_exact(TICK_RECORD_LEN) {
        ticks.push(RawTick {
            time_offset_ms: u32::from_be_bytes(rec[0..4].try_into().unwrap()),
            ask_scaled: u32::from_be_bytes(rec[4..8].try_into().unwrap()),
            bid_scaled: u32::from_be_bytes(rec[8..12].try_into().unwrap()),
            ask_volume: f32::from_be_bytes(rec[12..16].try_into().unwrap()),
            bid_volume: f32::from_be_bytes(rec[16..20].try_into().unwrap()),
        });
    }

    ticks
}

/// Serialize ticks back into a compressed blob.
///
/// The exact inverse of [`decode_hour`]; used to build synthetic archive
/// fixtures for tests and local tooling.
pub fn encode_hour(ticks: &[RawTick]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(ticks.len() * TICK_RECORD_LEN);
    for t in ticks {
        raw.extend_from_slice(&t.time_offset_ms.to_be_bytes());
        raw.extend_from_slice(&t.ask_scaled.to_be_bytes());
        raw.extend_from_slice(&t.bid_scaled.to_be_bytes());
        raw.extend_from_slice(&t.ask_volume.to_be_bytes());
        raw.extend_from_slice(&t.bid_volume.to_be_bytes());
    }

    let mut blob = Vec::new();
    lzma_rs::lzma_compress(&mut Cursor::new(&raw), &mut blob)
        .expect("in-memory lzma compression cannot fail");
    blob
}
