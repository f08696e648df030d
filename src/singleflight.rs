//! Request coalescing: for a burst of concurrent callers asking for the
//! same key, run the underlying work exactly once and hand every caller
//! the same result.
//!
//! `tokio::sync::OnceCell` already gives us "run this closure exactly once
//! across however many callers race to initialize it," which is the
//! coalescing guarantee this type exists to provide.
//! What it doesn't give us is the "forget this key once the burst is over"
//! part -- a `OnceCell` has no way to reset -- so a thin map of
//! short-lived cells, swapped out once the in-flight call completes, sits
//! on top.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::CacheError;

/// Coalesces concurrent calls for the same key into a single invocation.
///
/// The map of in-flight calls is guarded by a [`parking_lot::Mutex`] that
/// is never held across the awaited closure -- only the per-key
/// [`OnceCell`] (shared by clone, not by holding the map lock) keeps
/// coalesced waiters blocked.
pub struct SingleFlightGroup<V> {
    calls: Mutex<HashMap<String, Arc<OnceCell<Result<V, Arc<CacheError>>>>>>,
}

impl<V> Default for SingleFlightGroup<V> {
    fn default() -> Self {
        SingleFlightGroup {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> SingleFlightGroup<V> {
    /// Builds an empty coalescer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` for `key`, coalescing it with any other in-flight call for
    /// the same key. Every caller in the same burst gets a clone of the
    /// same result. Calls arriving strictly after the burst completes
    /// trigger a fresh invocation of `f`.
    ///
    /// `f` is invoked with no locks held, so it may call back into
    /// whatever owns this group -- as long as it does not recursively
    /// coalesce on the same `key`, which would deadlock against itself.
    pub async fn do_call<F, Fut>(&self, key: &str, f: F) -> Result<V, Arc<CacheError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CacheError>>,
    {
        let cell = {
            let mut calls = self.calls.lock();
            calls
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_init(|| async move { f().await.map_err(Arc::new) })
            .await
            .clone();

        let mut calls = self.calls.lock();
        if let Some(current) = calls.get(key) {
            if Arc::ptr_eq(current, &cell) {
                calls.remove(key);
            }
        }

        result
    }
}
