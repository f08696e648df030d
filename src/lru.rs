//! A byte-accounted LRU store.
//!
//! Keys are `String` and values must report their own weight via
//! [`crate::Weighted`] -- that's what lets the store charge
//! `key.len() + value.weight()` against its budget. The store is *not*
//! internally synchronized; [`crate::concurrent::ConcurrentCache`] is the
//! only place that takes a lock around it.

use std::collections::HashMap;

use crate::list::List;
use crate::Weighted;

/// Called when an entry is evicted to make room for a new one.
pub trait OnEvicted<V> {
    /// Invoked with the evicted key and value, after it has already been
    /// removed from the store.
    fn on_evicted(&mut self, key: &str, value: &V);
}

impl<F, V> OnEvicted<V> for F
where
    F: FnMut(&str, &V),
{
    fn on_evicted(&mut self, key: &str, value: &V) {
        (self)(key, value)
    }
}

/// A no-op eviction callback, used when the caller doesn't care.
#[derive(Debug, Default)]
pub struct NoopEvicted;

impl<V> OnEvicted<V> for NoopEvicted {
    fn on_evicted(&mut self, _key: &str, _value: &V) {}
}

/// A byte-bounded least-recently-used store.
///
/// `max_bytes == 0` means unbounded -- the eviction loop in [`Self::set`]
/// is guarded on `max_bytes > 0` and never runs.
pub struct LruStore<V: Weighted, E: OnEvicted<V> = NoopEvicted> {
    max_bytes: usize,
    used_bytes: usize,
    index: HashMap<String, usize>,
    entries: List<String, V>,
    on_evicted: E,
}

impl<V: Weighted> LruStore<V, NoopEvicted> {
    /// Builds an empty store with no eviction callback.
    pub fn new(max_bytes: usize) -> Self {
        LruStore::with_evicted(max_bytes, NoopEvicted)
    }
}

impl<V: Weighted, E: OnEvicted<V>> LruStore<V, E> {
    /// Builds an empty store that invokes `on_evicted` for every entry it
    /// drops to stay within `max_bytes`.
    pub fn with_evicted(max_bytes: usize, on_evicted: E) -> Self {
        LruStore {
            max_bytes,
            used_bytes: 0,
            index: HashMap::new(),
            entries: List::new(),
            on_evicted,
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// Total bytes currently charged against `max_bytes`.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Looks up `key`, promoting it to the most-recently-used position on
    /// a hit. Does not change capacity accounting.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.entries.move_to_front(idx);
        Some(self.entries.value(idx))
    }

    /// Inserts or updates `key`, then evicts from the back until the
    /// store is back under `max_bytes` (if bounded).
    ///
    /// A single entry whose own cost exceeds `max_bytes` is the one
    /// documented degenerate case: the eviction loop drains every other
    /// entry and then stops, leaving only that oversized entry resident.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            self.entries.move_to_front(idx);
            let old_cost = self.entries.weight(idx);
            let new_cost = key.len() + value.weight();
            self.used_bytes = self.used_bytes - old_cost + new_cost;
            self.entries.set_weight(idx, new_cost);
            *self.entries.value_mut(idx) = value;
        } else {
            let weight = key.len() + value.weight();
            let idx = self.entries.push_front(key.clone(), value, weight);
            self.index.insert(key, idx);
            self.used_bytes += weight;
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    /// Removes the least-recently-used entry, invoking the eviction
    /// callback. A no-op on an empty store.
    pub fn remove_oldest(&mut self) {
        self.evict_oldest();
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(idx) = self.entries.back() else {
            return false;
        };
        let (key, value, weight) = self.entries.remove(idx);
        self.index.remove(&key);
        self.used_bytes -= weight;
        self.on_evicted.on_evicted(&key, &value);
        true
    }
}

impl<V: Weighted, E: OnEvicted<V>> std::fmt::Debug for LruStore<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.entries.len())
            .finish()
    }
}
