//! A TTL-gated, in-memory cache for one provider's full station list.
//!
//! Each regional provider keeps a single [`StationCache`] and refreshes it
//! lazily: a call on a fresh snapshot returns it unchanged, a call on a stale
//! or absent snapshot performs the upstream fetch and replaces the snapshot
//! wholesale. A failed fetch yields an empty list *without* advancing the TTL
//! clock, so the next call retries immediately instead of serving a stale
//! empty result for a full TTL window.

use crate::providers::error::ProviderError;
use futures_util::future::BoxFuture;
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, ProviderError>> + Send + Sync>;

struct Snapshot<T> {
    stations: Arc<Vec<T>>,
    fetched_at: Instant,
}

/// Generic station-list cache, constructed from a TTL and an injectable async
/// fetch function so providers (and tests) control the upstream.
pub struct StationCache<T> {
    ttl: Duration,
    fetch: FetchFn<T>,
    snapshot: RwLock<Option<Snapshot<T>>>,
}

impl<T: Send + Sync> StationCache<T> {
    pub fn new<F>(ttl: Duration, fetch: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Vec<T>, ProviderError>> + Send + Sync + 'static,
    {
        Self {
            ttl,
            fetch: Box::new(fetch),
            snapshot: RwLock::new(None),
        }
    }

    /// Returns the cached station list, refreshing it first when expired.
    ///
    /// On upstream failure the error is logged and an empty list is returned;
    /// `fetched_at` stays untouched so the next call retries right away.
    pub async fn get_all(&self) -> Arc<Vec<T>> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if snapshot.fetched_at.elapsed() < self.ttl {
                    debug!("station cache hit ({} stations)", snapshot.stations.len());
                    return Arc::clone(&snapshot.stations);
                }
            }
        }

        // Fetch without holding the lock. Two tasks racing on an expired
        // snapshot may both fetch; the snapshot swap below is wholesale, so
        // readers never observe partial data.
        match (self.fetch)().await {
            Ok(stations) => {
                let stations = Arc::new(stations);
                let mut guard = self.snapshot.write().await;
                *guard = Some(Snapshot {
                    stations: Arc::clone(&stations),
                    fetched_at: Instant::now(),
                });
                debug!("station cache refreshed ({} stations)", stations.len());
                stations
            }
            Err(e) => {
                warn!("station list fetch failed: {e}");
                Arc::new(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_call_within_ttl_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = StationCache::new(Duration::from_secs(600), move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1u32, 2, 3])
            }) as BoxFuture<'static, Result<Vec<u32>, ProviderError>>
        });

        assert_eq!(cache.get_all().await.len(), 3);
        assert_eq!(cache.get_all().await.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_triggers_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = StationCache::new(Duration::from_millis(20), move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![7u32])
            }) as BoxFuture<'static, Result<Vec<u32>, ProviderError>>
        });

        cache.get_all().await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.get_all().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_returns_empty_and_retries_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = StationCache::new(Duration::from_secs(600), move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(ProviderError::MissingKey)
                } else {
                    Ok(vec![5u32])
                }
            }) as BoxFuture<'static, Result<Vec<u32>, ProviderError>>
        });

        // First call fails: empty list, TTL clock not advanced.
        assert!(cache.get_all().await.is_empty());
        // Immediate retry is permitted and succeeds.
        assert_eq!(cache.get_all().await.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
