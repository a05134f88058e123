//! Process-wide snapshot cache.
//!
//! One entry, replaced wholesale on refresh. The entry sits behind an async
//! mutex that stays held across a refresh, so a cold or expired cache admits
//! exactly one in-flight ingestion; concurrent callers queue on the lock and
//! read the entry the winner wrote.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::IngestError;
use crate::parse::header::ColumnMap;
use crate::parse::records::LicenseRecord;
use crate::parse::Snapshot;

/// Time source, injected so expiry is testable without waiting out a TTL.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone)]
pub struct CacheEntry {
    pub captured_at: Instant,
    pub records: Arc<Vec<LicenseRecord>>,
    pub column_map: ColumnMap,
}

pub struct Cache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: tokio::sync::Mutex<Option<CacheEntry>>,
}

impl Cache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Cache {
            ttl,
            clock,
            entry: tokio::sync::Mutex::new(None),
        }
    }

    /// Return the live entry, running `load` to (re)populate it when missing
    /// or expired. A failed load leaves any previous entry untouched and
    /// surfaces the error; a stale entry is only ever replaced by a success.
    pub async fn get_with<F, Fut>(&self, load: F) -> Result<CacheEntry, IngestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Snapshot, IngestError>>,
    {
        let mut guard = self.entry.lock().await;
        let now = self.clock.now();

        if let Some(entry) = guard.as_ref() {
            if now.duration_since(entry.captured_at) < self.ttl {
                debug!(
                    age_secs = now.duration_since(entry.captured_at).as_secs(),
                    "cache hit"
                );
                return Ok(entry.clone());
            }
        }

        let snapshot = load().await?;
        let entry = CacheEntry {
            captured_at: now,
            records: Arc::new(snapshot.records),
            column_map: snapshot.column_map,
        };
        info!(records = entry.records.len(), "cache refreshed");
        *guard = Some(entry.clone());
        Ok(entry)
    }

    /// Drop the current entry; the next `get_with` runs the pipeline again.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Starts at a fixed origin and only moves when told to.
    struct ManualClock {
        origin: Instant,
        offset_secs: AtomicU64,
    }

    impl ManualClock {
        fn new() -> Self {
            ManualClock {
                origin: Instant::now(),
                offset_secs: AtomicU64::new(0),
            }
        }

        fn advance_secs(&self, secs: u64) {
            self.offset_secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + Duration::from_secs(self.offset_secs.load(Ordering::SeqCst))
        }
    }

    fn record(license_number: &str) -> LicenseRecord {
        LicenseRecord {
            license_number: license_number.to_string(),
            license_type: String::new(),
            category: String::new(),
            holder: "Holder".to_string(),
            dba: String::new(),
            city: String::new(),
            original_date: String::new(),
            next_reissue: String::new(),
            qualified_rep: String::new(),
            mn_manager: String::new(),
            mn_phone: String::new(),
            corp_phone: String::new(),
            email: String::new(),
            mn_address: String::new(),
        }
    }

    fn snapshot(license_number: &str) -> Snapshot {
        Snapshot {
            records: vec![record(license_number)],
            column_map: ColumnMap::fixed(),
        }
    }

    #[tokio::test]
    async fn second_get_within_ttl_skips_the_loader() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Duration::from_secs(600), clock.clone());
        let loads = AtomicU64::new(0);

        for _ in 0..2 {
            let loads = &loads;
            let entry = cache
                .get_with(|| async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(snapshot("1"))
                })
                .await
                .unwrap();
            assert_eq!(entry.records[0].license_number, "1");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_reload() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Duration::from_secs(600), clock.clone());

        let first = cache.get_with(|| async { Ok(snapshot("1")) }).await.unwrap();
        assert_eq!(first.records[0].license_number, "1");

        clock.advance_secs(601);
        let second = cache.get_with(|| async { Ok(snapshot("2")) }).await.unwrap();
        assert_eq!(second.records[0].license_number, "2");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_stale_entry() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Duration::from_secs(600), clock.clone());

        cache.get_with(|| async { Ok(snapshot("1")) }).await.unwrap();
        clock.advance_secs(601);

        let err = cache
            .get_with(|| async {
                Err::<Snapshot, _>(IngestError::Format("upstream down".to_string()))
            })
            .await;
        assert!(err.is_err());

        // The failure did not clobber the entry; the next success replaces it.
        let entry = cache.get_with(|| async { Ok(snapshot("3")) }).await.unwrap();
        assert_eq!(entry.records[0].license_number, "3");
    }

    #[tokio::test]
    async fn invalidate_forces_the_next_get_to_reload() {
        let clock = Arc::new(ManualClock::new());
        let cache = Cache::new(Duration::from_secs(600), clock);

        cache.get_with(|| async { Ok(snapshot("1")) }).await.unwrap();
        cache.invalidate().await;

        let entry = cache.get_with(|| async { Ok(snapshot("2")) }).await.unwrap();
        assert_eq!(entry.records[0].license_number, "2");
    }
}
