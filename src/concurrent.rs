//! A thin, lock-serialized wrapper around [`crate::lru::LruStore`].
//!
//! This is the *only* place the LRU store is touched; the store itself
//! carries no synchronization of its own. The lock is a [`parking_lot::Mutex`]
//! rather than a `tokio::sync` one because the critical section is pure
//! in-memory bookkeeping and never spans an `.await` -- holding a lock
//! across network I/O would be exactly the foot-gun this wrapper avoids.

use parking_lot::Mutex;

use crate::lru::LruStore;
use crate::Weighted;

/// A mutex-guarded [`LruStore`] that constructs itself lazily.
///
/// The store isn't allocated until the first [`ConcurrentCache::set`];
/// a [`ConcurrentCache::get`] against an empty cache is a plain "not
/// found" with no allocation, matching the uninitialized-store fast path.
pub struct ConcurrentCache<V: Weighted> {
    cache_bytes: usize,
    store: Mutex<Option<LruStore<V>>>,
}

impl<V: Weighted + Clone> ConcurrentCache<V> {
    /// Builds a cache that will lazily allocate an [`LruStore`] bounded at
    /// `cache_bytes` on first write.
    pub fn new(cache_bytes: usize) -> Self {
        ConcurrentCache {
            cache_bytes,
            store: Mutex::new(None),
        }
    }

    /// Looks up `key`. Returns `None` without allocating if no write has
    /// happened yet.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.store.lock();
        guard.as_mut()?.get(key).cloned()
    }

    /// Inserts or updates `key`, allocating the backing store on first use.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut guard = self.store.lock();
        guard
            .get_or_insert_with(|| LruStore::new(self.cache_bytes))
            .set(key, value);
    }

    /// Number of resident entries, or 0 if the store hasn't been
    /// allocated yet.
    pub fn len(&self) -> usize {
        self.store.lock().as_ref().map_or(0, LruStore::len)
    }

    /// True if the cache holds no entries (including if never written to).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Weighted + Clone> std::fmt::Debug for ConcurrentCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentCache")
            .field("cache_bytes", &self.cache_bytes)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byteview::ByteView;

    #[test]
    fn get_before_any_write_does_not_allocate_and_misses() {
        let cache: ConcurrentCache<ByteView> = ConcurrentCache::new(1024);
        assert!(cache.get("absent").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache: ConcurrentCache<ByteView> = ConcurrentCache::new(1024);
        cache.set("k", ByteView::new(Vec::from(*b"v")));
        assert_eq!(cache.get("k").unwrap().as_slice(), b"v");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_writers_serialize_without_losing_entries() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(ConcurrentCache::<ByteView>::new(1 << 20));
        let mut handles = Vec::new();
        for t in 0..8 {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{t}-{i}");
                    cache.set(key.clone(), ByteView::new(key.clone().into_bytes()));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 8 * 50);
    }
}
