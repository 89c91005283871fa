//! Named, time-boxed cache region.
//!
//! A `SharedCache` is a key-value store of serialized JSON payloads with
//! per-entry TTL expiry. Entries are never invalidated on data change;
//! staleness up to the TTL window is the accepted tradeoff. Concurrent
//! readers and writers are safe: last write wins on a key, independent
//! keys are fully independent. Cache-miss stampedes are not de-duplicated.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::domain::AppError;

#[derive(Debug)]
pub struct SharedCache {
    name: String,
    inner: RwLock<CacheMap>,
}

impl SharedCache {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(CacheMap::new()),
        }
    }

    /// Region name, used for logging and metric labels.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn set_ex<T: serde::Serialize>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<(), AppError> {
        let entry = CacheEntry::new(value, ttl)?;

        let mut lock = self.inner.write().await;
        lock.set(key.to_string(), entry);

        Ok(())
    }

    /// The cached payload under `key`, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let lock = self.inner.read().await;
        lock.get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone())
    }

    pub async fn delete(&self, key: &str) {
        let mut lock = self.inner.write().await;
        lock.delete(key);
    }

    pub async fn clear(&self) {
        let mut lock = self.inner.write().await;
        lock.clear();
    }
}

/// Deterministic cache key from a raw request query string: the pair
/// fragments sorted lexicographically, so parameter order does not split
/// the cache. An absent or empty query maps to the empty key.
#[must_use]
pub fn cache_key(raw_query: Option<&str>) -> String {
    let Some(raw) = raw_query else {
        return String::new();
    };
    let mut pairs: Vec<&str> = raw.split('&').filter(|pair| !pair.is_empty()).collect();
    pairs.sort_unstable();
    pairs.join("&")
}

#[derive(Debug)]
struct CacheMap(HashMap<String, CacheEntry>);

impl CacheMap {
    fn new() -> Self {
        CacheMap(HashMap::new())
    }

    fn set(&mut self, key: String, entry: CacheEntry) {
        self.0.insert(key, entry);
    }

    fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.0.get(key)
    }

    fn delete(&mut self, key: &str) {
        self.0.remove(key);
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn new<T: serde::Serialize>(data: T, ttl: Duration) -> Result<Self, AppError> {
        let data = serde_json::to_value(data)?;
        Ok(Self {
            data,
            expires_at: Instant::now() + ttl,
        })
    }

    fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = SharedCache::new("safe-apps");
        cache.set_ex("chainId=4", vec![1, 2, 3], TTL).await.unwrap();

        let value = cache.get("chainId=4").await.unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = SharedCache::new("safe-apps");
        assert!(cache.get("chainId=4").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = SharedCache::new("safe-apps");
        cache
            .set_ex("chainId=4", "payload", Duration::ZERO)
            .await
            .unwrap();

        assert!(cache.get("chainId=4").await.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = SharedCache::new("safe-apps");
        cache.set_ex("chainId=1", "one", TTL).await.unwrap();
        cache.set_ex("chainId=4", "four", TTL).await.unwrap();

        assert_eq!(cache.get("chainId=1").await.unwrap(), "one");
        assert_eq!(cache.get("chainId=4").await.unwrap(), "four");
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = SharedCache::new("safe-apps");
        cache.set_ex("k", "old", TTL).await.unwrap();
        cache.set_ex("k", "new", TTL).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache = SharedCache::new("safe-apps");
        cache.set_ex("a", 1, TTL).await.unwrap();
        cache.set_ex("b", 2, TTL).await.unwrap();

        cache.delete("a").await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());

        cache.clear().await;
        assert!(cache.get("b").await.is_none());
    }

    #[test]
    fn test_cache_key_is_order_insensitive() {
        assert_eq!(
            cache_key(Some("b=2&a=1")),
            cache_key(Some("a=1&b=2"))
        );
        assert_eq!(cache_key(Some("chainId=4")), "chainId=4");
    }

    #[test]
    fn test_cache_key_empty_query() {
        assert_eq!(cache_key(None), "");
        assert_eq!(cache_key(Some("")), "");
    }

    #[test]
    fn test_cache_key_distinguishes_values() {
        assert_ne!(cache_key(Some("chainId=4")), cache_key(Some("chainId=1")));
    }
}
