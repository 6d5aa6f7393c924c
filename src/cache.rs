// src/cache.rs
//! In-process TTL cache for joined content.
//!
//! Entries are keyed by strings such as `posts_en` or `post_en_hello`, and
//! hold the computed value plus the moment it was captured. A read returns
//! the value only while it is fresh; a stale entry is left in place until
//! the next write for that key overwrites it. There is no capacity bound:
//! the key space is (operation × language × slug).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

struct CacheEntry<V> {
    value: V,
    cached_at: Instant,
}

/// Read-through TTL map. The lock is only held for the map operation itself,
/// never across an upstream call; two concurrent misses both recompute and
/// the last write wins.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Returns the cached value if present and younger than the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.cached_at) >= self.ttl {
            log::debug!("Cache stale: {}", key);
            return None;
        }
        log::debug!("Cache hit: {}", key);
        Some(entry.value.clone())
    }

    /// Stores a value, replacing whatever was there.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            cached_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_clock(ttl: Duration) -> (TtlCache<Vec<u32>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::new(ttl, clock.clone()), clock)
    }

    #[test]
    fn fresh_entries_are_served() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(300));
        cache.insert("posts_en", vec![1, 2]);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("posts_en"), Some(vec![1, 2]));
        assert_eq!(cache.get("posts_zh"), None);
    }

    #[test]
    fn stale_entries_are_recomputed_not_served() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(300));
        cache.insert("posts_en", vec![1]);
        clock.advance(Duration::from_secs(300));
        assert_eq!(cache.get("posts_en"), None);

        cache.insert("posts_en", vec![2]);
        assert_eq!(cache.get("posts_en"), Some(vec![2]));
    }
}
