//! Bounded LRU cache with per-entry TTL for upstream responses.

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// Fixed-width key derived from an endpoint and its normalized parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Derive the cache key for a request.
///
/// Parameters are serialized sorted by name; values are lower-cased with
/// whitespace trimmed and collapsed, so `"  Mersea   Island"` and
/// `"mersea island"` share a key.
pub fn cache_key<'a, I>(endpoint: &str, params: I) -> CacheKey
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sorted: BTreeMap<&str, String> = params
        .into_iter()
        .map(|(name, value)| (name, normalize_value(value)))
        .collect();

    let mut canonical = String::with_capacity(64);
    canonical.push_str(endpoint);
    canonical.push(':');
    for (i, (name, value)) in sorted.iter().enumerate() {
        if i > 0 {
            canonical.push('&');
        }
        canonical.push_str(name);
        canonical.push('=');
        canonical.push_str(value);
    }

    CacheKey(xxh64(canonical.as_bytes(), 0))
}

fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Counters reported by the status operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

struct CacheState<V> {
    entries: LruCache<CacheKey, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe response cache.
///
/// Every operation, including the recency bump inside `get`, runs under one
/// short-held lock. Expired entries are only dropped when looked up.
pub struct ResponseCache<V> {
    state: Mutex<CacheState<V>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
            ttl,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut state = self.state.lock();

        let expired = state
            .entries
            .peek(key)
            .map(|entry| entry.created_at.elapsed() > self.ttl);

        match expired {
            None => {
                state.misses += 1;
                None
            }
            Some(true) => {
                debug!("Cache entry {} expired", key);
                state.entries.pop(key);
                state.misses += 1;
                None
            }
            Some(false) => {
                let value = state.entries.get(key).map(|entry| entry.value.clone());
                state.hits += 1;
                value
            }
        }
    }

    pub fn put(&self, key: CacheKey, value: V) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
        };
        let mut state = self.state.lock();
        if let Some((evicted, _)) = state.entries.push(key, entry) {
            if evicted != key {
                debug!("Cache full, evicted {}", evicted);
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            size: state.entries.len(),
            capacity: state.entries.cap().get(),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> CacheKey {
        let value = n.to_string();
        cache_key("search", [("q", value.as_str())])
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let a = cache_key("search", [("q", "Mersea Island"), ("limit", "1")]);
        let b = cache_key("search", [("q", "  mersea   island"), ("limit", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_parameter_order() {
        let a = cache_key("search", [("q", "paris"), ("limit", "5")]);
        let b = cache_key("search", [("limit", "5"), ("q", "paris")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_depends_on_endpoint_and_values() {
        let base = cache_key("search", [("q", "paris")]);
        assert_ne!(base, cache_key("lookup", [("q", "paris")]));
        assert_ne!(base, cache_key("search", [("q", "tokyo")]));
        assert_ne!(base, cache_key("search", [("q", "paris"), ("limit", "2")]));
    }

    #[test]
    fn test_key_display_is_fixed_width() {
        assert_eq!(key(1).to_string().len(), 16);
    }

    #[tokio::test]
    async fn test_get_put_and_stats() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        assert_eq!(cache.get(&key(1)), None);
        cache.put(key(1), "one");
        assert_eq!(cache.get(&key(1)), Some("one"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
    }

    #[tokio::test]
    async fn test_capacity_evicts_first_inserted() {
        let cache = ResponseCache::new(Duration::from_secs(60), 3);
        for n in 0..4 {
            cache.put(key(n), n);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&key(0)), None);
        assert_eq!(cache.get(&key(3)), Some(3));
    }

    #[tokio::test]
    async fn test_access_refreshes_recency() {
        let cache = ResponseCache::new(Duration::from_secs(60), 3);
        cache.put(key(0), 0);
        cache.put(key(1), 1);
        cache.put(key(2), 2);

        // 0 becomes most recent, so 1 is now the eviction candidate.
        assert_eq!(cache.get(&key(0)), Some(0));
        cache.put(key(3), 3);

        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.get(&key(0)), Some(0));
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_replacing_existing_key_does_not_evict() {
        let cache = ResponseCache::new(Duration::from_secs(60), 2);
        cache.put(key(0), 0);
        cache.put(key(1), 1);
        cache.put(key(0), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(0)), Some(10));
        assert_eq!(cache.get(&key(1)), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss_and_purged() {
        let cache = ResponseCache::new(Duration::from_secs(3600), 10);
        cache.put(key(0), 0);

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert_eq!(cache.get(&key(0)), Some(0));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&key(0)), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_resets_age() {
        let cache = ResponseCache::new(Duration::from_secs(10), 10);
        cache.put(key(0), 0);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put(key(0), 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&key(0)), Some(1));
    }

    #[test]
    fn test_zero_capacity_holds_one_entry() {
        let cache = ResponseCache::new(Duration::from_secs(60), 0);
        cache.put(key(0), 0);
        cache.put(key(1), 1);
        assert_eq!(cache.stats().capacity, 1);
        assert_eq!(cache.get(&key(0)), None);
        assert_eq!(cache.get(&key(1)), Some(1));
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        cache.put(key(0), 0);
        assert_eq!(cache.get(&key(0)), Some(0));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }
}
