//! Per-run LRU cache for per-line positional hash arrays.
//!
//! The fingerprint builder hashes every coverage line against all 256 seed
//! triples. Lines shared by many tests would be rehashed once per test, so
//! the builder memoizes the per-line arrays here. Correctness never depends
//! on this cache; dropping it only costs speed.

use std::collections::HashMap;

/// Maximum number of memoized per-line hash arrays.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Fraction of entries dropped in a single eviction pass.
const EVICTION_FRACTION: f64 = 0.2;

struct CacheSlot<V> {
    value: V,
    last_used: u64,
}

/// An LRU map keyed by coverage-line key. On overflow the 20%
/// least-recently-used entries are evicted in one pass.
pub struct HashLruCache<V> {
    slots: HashMap<String, CacheSlot<V>>,
    capacity: usize,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl<V> HashLruCache<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            slots: HashMap::with_capacity(capacity),
            capacity,
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fetch the memoized value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: &str, compute: F) -> &V
    where
        F: FnOnce() -> V,
    {
        self.clock += 1;
        let clock = self.clock;

        if self.slots.contains_key(key) {
            self.hits += 1;
            let slot = self.slots.get_mut(key).unwrap();
            slot.last_used = clock;
            return &slot.value;
        }

        self.misses += 1;
        if self.slots.len() >= self.capacity {
            self.evict();
        }
        self.slots.insert(
            key.to_string(),
            CacheSlot {
                value: compute(),
                last_used: clock,
            },
        );
        &self.slots[key].value
    }

    /// Drop the least-recently-used 20% of entries in one pass.
    fn evict(&mut self) {
        let drop_count = ((self.slots.len() as f64 * EVICTION_FRACTION).ceil() as usize).max(1);

        let mut stamps: Vec<u64> = self.slots.values().map(|s| s.last_used).collect();
        stamps.sort_unstable();
        let cutoff = stamps[drop_count - 1];

        // <= cutoff may drop a few extra entries when stamps tie; ties only
        // occur across distinct keys inserted before any lookup bumped them,
        // and overshooting the 20% mark is harmless.
        self.slots.retain(|_, slot| slot.last_used > cutoff);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.slots.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl<V> Default for HashLruCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hit/miss counters for debug logging at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.hits + self.misses;
        let rate = if total > 0 {
            self.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        write!(
            f,
            "{} entries, {} hits, {} misses, {:.1}% hit rate",
            self.entries, self.hits, self.misses, rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let mut cache: HashLruCache<Vec<u64>> = HashLruCache::with_capacity(4);

        let first = cache.get_or_insert_with("a.php:1", || vec![1, 2, 3]).clone();
        assert_eq!(first, vec![1, 2, 3]);

        // Second lookup must not recompute
        let second = cache.get_or_insert_with("a.php:1", || panic!("recomputed"));
        assert_eq!(*second, vec![1, 2, 3]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_eviction_drops_oldest_fifth() {
        let mut cache: HashLruCache<u32> = HashLruCache::with_capacity(10);
        for i in 0..10 {
            cache.get_or_insert_with(&format!("f.php:{i}"), || i);
        }
        assert_eq!(cache.len(), 10);

        // Touch lines 2..10 so line 0 and 1 become the LRU entries
        for i in 2..10 {
            cache.get_or_insert_with(&format!("f.php:{i}"), || unreachable!());
        }

        // Inserting at capacity evicts ceil(10 * 0.2) = 2 entries
        cache.get_or_insert_with("f.php:10", || 10);
        assert_eq!(cache.len(), 9);
        assert_eq!(cache.stats().entries, 9);

        // The evicted entries were the untouched ones
        let mut recomputed = false;
        cache.get_or_insert_with("f.php:0", || {
            recomputed = true;
            0
        });
        assert!(recomputed);
    }

    #[test]
    fn test_eviction_single_pass_keeps_recent() {
        let mut cache: HashLruCache<u32> = HashLruCache::with_capacity(5);
        for i in 0..5 {
            cache.get_or_insert_with(&format!("k{i}"), || i);
        }
        cache.get_or_insert_with("k5", || 5);

        // k4 was the most recent pre-eviction entry and must survive
        let mut recomputed = false;
        cache.get_or_insert_with("k4", || {
            recomputed = true;
            99
        });
        assert!(!recomputed);
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            entries: 3,
            hits: 7,
            misses: 3,
        };
        let rendered = stats.to_string();
        assert!(rendered.contains("3 entries"));
        assert!(rendered.contains("70.0% hit rate"));
    }
}
