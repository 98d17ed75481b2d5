//! Fixed-capacity lookup cache with insertion-order eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Case-fold and trim a lookup key so equivalent queries collide.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

struct CacheInner<V> {
    entries: HashMap<String, V>,
    /// Keys in first-insertion order, oldest at the front.
    order: VecDeque<String>,
}

/// A cache holding at most `capacity` entries.
///
/// When full, the entry inserted longest ago is evicted. Reads do not
/// refresh an entry's position, so this is FIFO rather than LRU.
pub struct BoundedCache<V> {
    capacity: usize,
    inner: Mutex<CacheInner<V>>,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity + 1),
                order: VecDeque::with_capacity(capacity + 1),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().entries.get(&normalize_key(key)).cloned()
    }

    /// Insert or overwrite. Overwriting keeps the key's original position.
    pub fn put(&self, key: &str, value: V) {
        let key = normalize_key(key);
        let mut guard = self.lock();
        let CacheInner { entries, order } = &mut *guard;

        if let Some(slot) = entries.get_mut(&key) {
            *slot = value;
            return;
        }

        entries.insert(key.clone(), value);
        order.push_back(key);

        while entries.len() > self.capacity {
            match order.pop_front() {
                Some(oldest) => {
                    entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_evicts_first_inserted() {
        let cache = BoundedCache::new(3);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.put(key, i);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(1));
        assert_eq!(cache.get("c"), Some(2));
        assert_eq!(cache.get("d"), Some(3));
    }

    #[test]
    fn test_reads_do_not_refresh_position() {
        let cache = BoundedCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get("a"), Some(1));

        cache.put("c", 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_keys_are_case_folded() {
        let cache = BoundedCache::new(4);
        cache.put("  Plaza Rizal ", "p");
        assert_eq!(cache.get("plaza rizal"), Some("p"));
        assert_eq!(cache.get("PLAZA RIZAL"), Some("p"));
    }

    #[test]
    fn test_overwrite_keeps_single_slot() {
        let cache = BoundedCache::new(2);
        cache.put("a", 1);
        cache.put("A", 10);
        cache.put("b", 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));

        // "a" is still the oldest insertion.
        cache.put("c", 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_puts_stay_bounded() {
        let cache = Arc::new(BoundedCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(&format!("{}-{}", t, i), i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
