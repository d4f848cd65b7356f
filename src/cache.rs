use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

type Shared = Arc<dyn Any + Send + Sync>;

/// Cache entry with expiration tracking
#[derive(Clone)]
pub struct CacheEntry {
    data: Shared,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Shared, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.data.downcast_ref::<T>().cloned()
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_hits: u64,
    pub fetch_errors: u64,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn record_hit(&mut self) {
        self.hits += 1;
    }

    fn record_miss(&mut self) {
        self.misses += 1;
    }

    fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
    }

    fn record_fetch_error(&mut self) {
        self.fetch_errors += 1;
    }
}

/// In-memory cache keyed by string with a fixed time-to-live.
///
/// Expired entries are kept around so a failed refresh can fall back to the
/// last good value. Only [`TtlCache::clear`] drops them.
///
/// Concurrent misses on the same key are not coalesced: every caller that
/// observes the miss runs its own fetch. The lock is never held while a
/// fetch is in flight.
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    stats: Arc<RwLock<CacheStats>>,
    ttl: Duration,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            ttl,
        }
    }

    /// Return the cached value for `key`, running `fetcher` on a miss or
    /// after expiry. When `fetcher` fails and any earlier value exists, that
    /// value is returned instead of the error.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let previous = self.entries.read().get(key).cloned();

        if let Some(entry) = &previous {
            if !entry.is_expired() {
                if let Some(value) = entry.value::<T>() {
                    debug!("Cache hit: {}", key);
                    self.stats.write().record_hit();
                    return Ok(value);
                }
            }
        }

        debug!("Cache miss: {}", key);
        self.stats.write().record_miss();

        match fetcher().await {
            Ok(value) => {
                self.insert(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.stats.write().record_fetch_error();
                match previous.as_ref().and_then(CacheEntry::value::<T>) {
                    Some(stale) => {
                        warn!(
                            "Serving stale cache entry {} after fetch failure [{}]: {}",
                            key,
                            err.error_code(),
                            err
                        );
                        self.stats.write().record_stale_hit();
                        Ok(stale)
                    }
                    None => Err(err),
                }
            }
        }
    }

    fn insert<T: Send + Sync + 'static>(&self, key: &str, value: T) {
        let entry = CacheEntry::new(Arc::new(value), self.ttl);
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), entry);
        self.stats.write().total_entries = entries.len();
    }

    /// Drop every entry, fresh or stale.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.stats.write().total_entries = 0;
        debug!("Cache cleared");
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Get all cache keys (for debugging/testing)
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        result: Result<Vec<&'static str>>,
    ) -> impl Future<Output = Result<Vec<&'static str>>> {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { result }
    }

    #[tokio::test]
    async fn test_hit_within_ttl_fetches_once() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_fetch("products", || counting_fetch(&calls, Ok(vec!["P1", "P2"])))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("products", || counting_fetch(&calls, Ok(vec!["P3"])))
            .await
            .unwrap();

        assert_eq!(first, vec!["P1", "P2"]);
        assert_eq!(second, vec!["P1", "P2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_scenario_serves_stale_after_expiry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        let at_zero = cache
            .get_or_fetch("products", || counting_fetch(&calls, Ok(vec!["P1", "P2"])))
            .await
            .unwrap();
        assert_eq!(at_zero, vec!["P1", "P2"]);

        tokio::time::advance(Duration::from_secs(30)).await;
        let at_thirty = cache
            .get_or_fetch("products", || {
                counting_fetch(&calls, Err(Error::Connection("unreachable".into())))
            })
            .await
            .unwrap();
        assert_eq!(at_thirty, vec!["P1", "P2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let at_sixty_one = cache
            .get_or_fetch("products", || {
                counting_fetch(&calls, Err(Error::Connection("unreachable".into())))
            })
            .await
            .unwrap();
        assert_eq!(at_sixty_one, vec!["P1", "P2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().stale_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_refreshed() {
        let cache = TtlCache::new(Duration::from_secs(10));

        cache
            .get_or_fetch("team:fr", || async { Ok::<_, Error>(1u32) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;

        let refreshed = cache
            .get_or_fetch("team:fr", || async { Ok::<_, Error>(2u32) })
            .await
            .unwrap();
        assert_eq!(refreshed, 2);

        let cached = cache
            .get_or_fetch("team:fr", || async { Ok::<_, Error>(3u32) })
            .await
            .unwrap();
        assert_eq!(cached, 2);
    }

    #[tokio::test]
    async fn test_cold_miss_propagates_error() {
        let cache = TtlCache::default();

        let result = cache
            .get_or_fetch("product:fr:mango", || async {
                Err::<Vec<String>, _>(Error::Unauthorized("bad token".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(!cache.contains("product:fr:mango"));
        assert_eq!(cache.stats().fetch_errors, 1);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let cache = TtlCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("slugs", || counting_fetch(&calls, Ok(vec!["a"])))
            .await
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let value = cache
            .get_or_fetch("slugs", || counting_fetch(&calls, Ok(vec!["b"])))
            .await
            .unwrap();
        assert_eq!(value, vec!["b"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_removes_stale_fallback() {
        let cache = TtlCache::new(Duration::ZERO);

        cache
            .get_or_fetch("stats", || async { Ok::<_, Error>(7u8) })
            .await
            .unwrap();
        cache.clear();

        let result = cache
            .get_or_fetch("stats", || async {
                Err::<u8, _>(Error::RateLimited("429".into()))
            })
            .await;
        assert!(matches!(result, Err(Error::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = TtlCache::default();

        cache
            .get_or_fetch("shared", || async { Ok::<_, Error>(String::from("text")) })
            .await
            .unwrap();
        let number = cache
            .get_or_fetch("shared", || async { Ok::<_, Error>(42u64) })
            .await
            .unwrap();

        assert_eq!(number, 42);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = TtlCache::default();

        cache
            .get_or_fetch("product:fr:mango", || async { Ok::<_, Error>(Some(1u8)) })
            .await
            .unwrap();
        cache
            .get_or_fetch("product:en:mango", || async { Ok::<_, Error>(Some(2u8)) })
            .await
            .unwrap();

        assert_eq!(cache.keys(), vec!["product:en:mango", "product:fr:mango"]);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_writes_nothing() {
        let cache = TtlCache::default();

        let slow = cache.get_or_fetch("articles:fr", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, Error>(vec![1u8])
        });
        let outcome = tokio::time::timeout(Duration::from_millis(10), slow).await;

        assert!(outcome.is_err());
        assert!(!cache.contains("articles:fr"));
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let mut stats = CacheStats::default();

        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 0.6666666666666666).abs() < f64::EPSILON);
    }
}
