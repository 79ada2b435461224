use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// In-memory TTL cache for generation results. Process-local by design:
/// a restart simply starts cold.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

#[derive(Clone)]
struct CacheEntry {
    data: serde_json::Value,
    stored_at: Instant,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub hit_rate: f64,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.data.clone());
            }
        }

        // Expired entries are removed lazily on read.
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn set(&self, key: String, data: serde_json::Value) {
        self.set_with_ttl(key, data, self.ttl);
    }

    pub fn set_with_ttl(&self, key: String, data: serde_json::Value, ttl: Duration) {
        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let now = Instant::now();
        self.entries.insert(
            key,
            CacheEntry {
                data,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    /// Drop expired entries. Called from the maintenance sweep.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: self.entries.len(),
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60), 10);
        cache.set("k".to_string(), json!({"a": 1}));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = ResponseCache::new(Duration::from_millis(0), 10);
        cache.set("k".to_string(), json!(1));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let cache = ResponseCache::new(Duration::from_secs(60), 2);
        cache.set("first".to_string(), json!(1));
        std::thread::sleep(Duration::from_millis(5));
        cache.set("second".to_string(), json!(2));
        std::thread::sleep(Duration::from_millis(5));
        cache.set("third".to_string(), json!(3));

        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(json!(2)));
        assert_eq!(cache.get("third"), Some(json!(3)));
    }

    #[test]
    fn cleanup_removes_expired() {
        let cache = ResponseCache::new(Duration::from_millis(0), 10);
        cache.set("a".to_string(), json!(1));
        cache.set("b".to_string(), json!(2));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.cleanup(), 2);
        assert_eq!(cache.stats().size, 0);
    }
}
