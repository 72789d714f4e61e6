//! Per-category record caches.
//!
//! A cache is a snapshot of the last list fetched for one category. Reads
//! that find it empty fetch first; reloads always fetch and replace the whole
//! list. Fetches are serialized per cache. Overlapping misses share one
//! fetch, and callers that queued behind an in-flight reload share one
//! follow-up fetch instead of each issuing their own. A reload never returns
//! data fetched before it was requested.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::remote::RemoteResult;

/// Snapshot cache for one record category.
pub struct RecordCache<T> {
    name: &'static str,
    slot: RwLock<Arc<Vec<T>>>,
    reload_lock: Mutex<()>,
    /// Number of fetches started so far
    fetches_begun: AtomicU64,
    /// Ticket of the most recent fetch that succeeded
    last_success: AtomicU64,
}

impl<T> RecordCache<T> {
    /// Create an empty cache.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RwLock::new(Arc::new(Vec::new())),
            reload_lock: Mutex::new(()),
            fetches_begun: AtomicU64::new(0),
            last_success: AtomicU64::new(0),
        }
    }

    /// Current contents without fetching. Empty until the first load.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        match self.slot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Number of successful fetches so far.
    pub fn load_count(&self) -> u64 {
        self.last_success.load(Ordering::SeqCst)
    }

    fn replace(&self, records: Vec<T>) -> Arc<Vec<T>> {
        let records = Arc::new(records);
        match self.slot.write() {
            Ok(mut guard) => *guard = Arc::clone(&records),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&records),
        }
        records
    }

    /// Return the cached list, fetching it first if the cache is empty.
    /// Misses that overlap share the first caller's fetch.
    pub async fn get_or_load<F, Fut>(&self, fetch: F) -> RemoteResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<Vec<T>>>,
    {
        let current = self.snapshot();
        if !current.is_empty() {
            debug!(cache = self.name, count = current.len(), "cache hit");
            return Ok(current);
        }

        let _guard = self.reload_lock.lock().await;
        let current = self.snapshot();
        if !current.is_empty() {
            debug!(cache = self.name, count = current.len(), "miss filled while waiting");
            return Ok(current);
        }
        self.fetch_locked(fetch).await
    }

    /// Fetch and replace the cached list.
    pub async fn reload<F, Fut>(&self, fetch: F) -> RemoteResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<Vec<T>>>,
    {
        let requested_at = self.fetches_begun.load(Ordering::SeqCst);
        let _guard = self.reload_lock.lock().await;

        if self.last_success.load(Ordering::SeqCst) > requested_at {
            debug!(cache = self.name, "reload coalesced with a newer fetch");
            return Ok(self.snapshot());
        }
        self.fetch_locked(fetch).await
    }

    /// Run one fetch. Callers hold `reload_lock`.
    async fn fetch_locked<F, Fut>(&self, fetch: F) -> RemoteResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<Vec<T>>>,
    {
        let ticket = self.fetches_begun.fetch_add(1, Ordering::SeqCst) + 1;
        let records = fetch().await?;
        let count = records.len();
        let records = self.replace(records);
        self.last_success.store(ticket, Ordering::SeqCst);

        info!(cache = self.name, count, "cache reloaded");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_on_miss_then_hit() {
        let cache = RecordCache::new("pets");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let first = cache
            .get_or_load(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
        assert_eq!(*first, vec![1, 2, 3]);

        let second = cache
            .get_or_load(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9])
            })
            .await
            .unwrap();
        assert_eq!(*second, vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_not_merges() {
        let cache = RecordCache::new("weight");
        cache.reload(|| async { Ok(vec![1, 2]) }).await.unwrap();
        cache.reload(|| async { Ok(vec![3]) }).await.unwrap();
        assert_eq!(*cache.snapshot(), vec![3]);
        assert_eq!(cache.load_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let cache = RecordCache::new("medical");
        cache.reload(|| async { Ok(vec![1]) }).await.unwrap();
        let err = cache
            .reload(|| async { Err::<Vec<i32>, _>(RemoteError::Network("down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
        assert_eq!(*cache.snapshot(), vec![1]);
    }

    #[tokio::test]
    async fn test_empty_result_is_refetched_on_next_read() {
        let cache: RecordCache<i32> = RecordCache::new("vaccine");
        cache.get_or_load(|| async { Ok(vec![]) }).await.unwrap();
        let again = cache.get_or_load(|| async { Ok(vec![7]) }).await.unwrap();
        assert_eq!(*again, vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_misses_share_one_fetch() {
        let cache = RecordCache::new("weight");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let slow_fetch = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, RemoteError>(vec![n])
        };
        let late_miss = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.get_or_load(slow_fetch).await
        };

        let (a, b) = tokio::join!(cache.get_or_load(slow_fetch), late_miss);

        assert_eq!(*a.unwrap(), vec![1]);
        assert_eq!(*b.unwrap(), vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_after_miss_still_refetches() {
        let cache = RecordCache::new("pets");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let slow_fetch = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, RemoteError>(vec![n])
        };
        let late_reload = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.reload(slow_fetch).await
        };

        let (a, b) = tokio::join!(cache.get_or_load(slow_fetch), late_reload);

        assert_eq!(*a.unwrap(), vec![1]);
        assert_eq!(*b.unwrap(), vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_reloads_share_one_fetch() {
        let cache = RecordCache::new("appointment");
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let slow_fetch = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, RemoteError>(vec![n])
        };

        // One reload in flight, two more queued behind it.
        let (a, b, c) = tokio::join!(
            cache.reload(slow_fetch),
            cache.reload(slow_fetch),
            cache.reload(slow_fetch),
        );

        assert_eq!(*a.unwrap(), vec![1]);
        assert_eq!(*b.unwrap(), vec![2]);
        assert_eq!(*c.unwrap(), vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
