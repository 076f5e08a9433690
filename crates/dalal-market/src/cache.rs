//! Time-bounded memoization of provider calls

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Cache key: the full argument tuple of a gateway call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Canonical symbol
    pub symbol: String,
    /// Gateway operation
    pub endpoint: String,
    /// Remaining arguments as a JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }
}

/// Thread-safe read-through cache with a fixed lifespan per entry.
///
/// Values are stored whole, so a cached `Err` is served like any other value
/// until it expires or is invalidated. Concurrent misses on one key share a
/// single fetch.
pub struct TtlCache<V> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
    in_flight: Arc<Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get a live value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        // TimedCache evicts expired entries on lookup, hence the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value for `key`, or compute, store and return it
    pub async fn get_or_insert_with<F, Fut>(&self, key: CacheKey, fetcher: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return value;
        }

        let slot = Arc::clone(self.in_flight.lock().await.entry(key.clone()).or_default());
        let value = {
            let _fetching = slot.lock().await;
            // a concurrent miss may have filled the entry while we waited
            if let Some(value) = self.get(&key).await {
                tracing::debug!("Cache hit after wait for key: {:?}", key);
                value
            } else {
                tracing::debug!("Cache miss for key: {:?}", key);
                let value = fetcher().await;
                self.insert(key.clone(), value.clone()).await;
                value
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        // map and this task hold the only references once everyone is done
        if Arc::strong_count(&slot) <= 2 {
            in_flight.remove(&key);
        }
        value
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let mut cache = self.cache.write().await;
        cache.cache_remove(key).is_some()
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_key_creation() {
        let key = CacheKey::new("TCS.NS", "history", serde_json::json!({"period": "3mo"}));
        assert_eq!(key.symbol, "TCS.NS");
        assert_eq!(key.endpoint, "history");
        assert!(key.params.contains("3mo"));
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("TCS.NS", "info", ());

        cache.insert(key.clone(), 3_950.5_f64).await;
        assert_eq!(cache.get(&key).await, Some(3_950.5));
    }

    #[tokio::test]
    async fn test_get_or_insert_with_fetches_once() {
        let cache: TtlCache<Result<f64, String>> = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("TCS.NS", "info", ());

        let mut call_count = 0;
        let first = cache
            .get_or_insert_with(key.clone(), || {
                call_count += 1;
                async { Ok(3_950.5) }
            })
            .await;
        assert_eq!(first, Ok(3_950.5));

        let second = cache
            .get_or_insert_with(key.clone(), || {
                call_count += 1;
                async { Ok(0.0) }
            })
            .await;
        assert_eq!(second, Ok(3_950.5));
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache: TtlCache<Result<f64, String>> = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("TCS.NS", "info", ());
        let calls = AtomicUsize::new(0);

        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(3_950.5)
            }
        };
        let (first, second) = tokio::join!(
            cache.get_or_insert_with(key.clone(), fetch),
            cache.get_or_insert_with(key.clone(), fetch),
        );

        assert_eq!(first, Ok(3_950.5));
        assert_eq!(second, Ok(3_950.5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_memoized_until_invalidated() {
        let cache: TtlCache<Result<f64, String>> = TtlCache::new(Duration::from_secs(60));
        let key = CacheKey::new("WIPRO.NS", "info", ());

        let failed = cache
            .get_or_insert_with(key.clone(), || async { Err("timeout".to_string()) })
            .await;
        assert!(failed.is_err());

        let still_failed = cache
            .get_or_insert_with(key.clone(), || async { Ok(480.0) })
            .await;
        assert!(still_failed.is_err());

        assert!(cache.invalidate(&key).await);
        let retried = cache
            .get_or_insert_with(key.clone(), || async { Ok(480.0) })
            .await;
        assert_eq!(retried, Ok(480.0));
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = TtlCache::new(Duration::from_secs(60));

        for i in 0..5 {
            let key = CacheKey::new(format!("STOCK{i}.NS"), "info", ());
            cache.insert(key, i).await;
        }

        assert_eq!(cache.len().await, 5);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }
}
