//! Fetch client: cache-first retrieval of hour blobs.
//!
//! Two seams: [`TickFeed`] above (what the scheduler works against) and
//! [`ArchiveSource`] below (what sits behind the cache), so tests can fake
//! either side independently.

use crate::archive::{ArchiveClient, ArchiveSource, FeedError};
use crate::cache::BlobCache;
use chrono::NaiveDate;

/// Source of compressed hour blobs. `Ok(None)` means "no data for this
/// hour" — a legitimate answer for weekends and vendor gaps.
pub trait TickFeed: Send + Sync {
    fn fetch_hour(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Option<Vec<u8>>, FeedError>;
}

/// Cache-first fetch client over the vendor archive.
///
/// Cache hits never touch the archive; archive hits populate the cache
/// before returning, so repeated runs over the same range never re-fetch.
/// Cache trouble degrades to an archive fetch rather than failing the hour.
pub struct FetchClient<A = ArchiveClient> {
    archive: A,
    cache: BlobCache,
}

impl<A: ArchiveSource> FetchClient<A> {
    pub fn new(archive: A, cache: BlobCache) -> Self {
        Self { archive, cache }
    }
}

impl<A: ArchiveSource> TickFeed for FetchClient<A> {
    fn fetch_hour(
        &self,
        symbol: &str,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Option<Vec<u8>>, FeedError> {
        match self.cache.get(symbol, date, hour) {
            Ok(Some(blob)) => return Ok(Some(blob)),
            Ok(None) => {}
            Err(e) => tracing::warn!(symbol, %date, hour, error = %e, "cache read failed, falling back to archive"),
        }

        match self.archive.fetch_hour(symbol, date, hour)? {
            Some(blob) => {
                if let Err(e) = self.cache.put(symbol, date, hour, &blob) {
                    tracing::warn!(symbol, %date, hour, error = %e, "failed to cache fetched blob");
                }
                Ok(Some(blob))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingArchive {
        calls: AtomicUsize,
        blob: Option<Vec<u8>>,
    }

    impl CountingArchive {
        fn new(blob: Option<Vec<u8>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                blob,
            }
        }
    }

    impl ArchiveSource for CountingArchive {
        fn fetch_hour(
            &self,
            _symbol: &str,
            _date: NaiveDate,
            _hour: u8,
        ) -> Result<Option<Vec<u8>>, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.blob.clone())
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 19).unwrap()
    }

    #[test]
    fn second_fetch_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let client = FetchClient::new(
            CountingArchive::new(Some(b"blob".to_vec())),
            BlobCache::new(dir.path()),
        );

        let first = client.fetch_hour("EURUSD", date(), 7).unwrap();
        assert_eq!(first.as_deref(), Some(b"blob".as_slice()));
        assert_eq!(client.archive.calls.load(Ordering::SeqCst), 1);

        let second = client.fetch_hour("EURUSD", date(), 7).unwrap();
        assert_eq!(second.as_deref(), Some(b"blob".as_slice()));
        assert_eq!(client.archive.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn archive_hit_populates_the_cache() {
        let dir = TempDir::new().unwrap();
        let cache = BlobCache::new(dir.path());
        let client =
            FetchClient::new(CountingArchive::new(Some(b"blob".to_vec())), cache);

        client.fetch_hour("EURUSD", date(), 7).unwrap();

        let cached = BlobCache::new(dir.path()).get("EURUSD", date(), 7).unwrap();
        assert_eq!(cached.as_deref(), Some(b"blob".as_slice()));
    }

    #[test]
    fn pre_seeded_cache_skips_the_archive_entirely() {
        let dir = TempDir::new().unwrap();
        let cache = BlobCache::new(dir.path());
        cache.put("EURUSD", date(), 7, b"seeded").unwrap();

        let client = FetchClient::new(CountingArchive::new(None), cache);
        let blob = client.fetch_hour("EURUSD", date(), 7).unwrap();

        assert_eq!(blob.as_deref(), Some(b"seeded".as_slice()));
        assert_eq!(client.archive.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_data_answers_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let client = FetchClient::new(CountingArchive::new(None), BlobCache::new(dir.path()));

        assert!(client.fetch_hour("EURUSD", date(), 7).unwrap().is_none());
        assert!(client.fetch_hour("EURUSD", date(), 7).unwrap().is_none());
        // An empty vendor answer may fill in later, so it is re-asked.
        assert_eq!(client.archive.calls.load(Ordering::SeqCst), 2);
    }
}
