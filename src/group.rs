//! The `Group` coordinator: local cache hit, peer dispatch, origin load,
//! all wrapped in single-flight coalescing.
//!
//! A `Group` is a named namespace binding one origin [`Getter`] to one
//! local [`ConcurrentCache`]. The process keeps a registry of every group
//! ever created, behind a lock, with nothing ever removed from it.
//! The single-flight coalescer is always wired into `load`: a miss never
//! reaches the origin or a peer more than once per key at a time.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::byteview::ByteView;
use crate::concurrent::ConcurrentCache;
use crate::error::{self, CacheError};
use crate::singleflight::SingleFlightGroup;

/// Loads a value for `key` from whatever origin a [`Group`] fronts --
/// a database, a filesystem, another service.
///
/// `GetterFn` lifts a plain closure into this trait so callers don't have
/// to hand-write a zero-field struct just to implement `Getter`.
#[async_trait]
pub trait Getter: Send + Sync {
    /// Loads the bytes for `key`, or an error if the origin has nothing
    /// for it (or failed to answer).
    async fn get(&self, key: &str) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Adapts a synchronous closure into a [`Getter`].
pub struct GetterFn<F>(pub F);

#[async_trait]
impl<F> Getter for GetterFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        (self.0)(key)
    }
}

/// Consults the consistent-hash ring for the peer that owns `key`.
///
/// Returns `None` when the ring is empty or the owner is the local node --
/// `Group::load` is only meant to dispatch to *remote* peers, so self-hits
/// fall straight through to the local origin load.
pub trait PeerPicker: Send + Sync {
    /// Picks the remote peer owning `key`, if any.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

/// A remote peer's side of the wire protocol: fetch `key` from `group` on
/// that peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Fetches `key` from the named group on this peer.
    async fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, CacheError>;
}

/// A named cache namespace: one origin [`Getter`], one local cache, an
/// optional peer picker, and a private single-flight coalescer.
pub struct Group {
    name: String,
    getter: Box<dyn Getter>,
    main_cache: ConcurrentCache<ByteView>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    loader: SingleFlightGroup<ByteView>,
}

type Registry = RwLock<std::collections::HashMap<String, Arc<Group>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(std::collections::HashMap::new()))
}

impl Group {
    /// Creates a group named `name` with a local cache bounded at
    /// `cache_bytes` (0 = unbounded) and registers it process-wide.
    ///
    /// `getter` must be a real value to type-check, so there is no "missing
    /// getter" state left to guard against here; see DESIGN.md.
    pub fn new(name: impl Into<String>, cache_bytes: usize, getter: impl Getter + 'static) -> Arc<Group> {
        let name = name.into();
        let group = Arc::new(Group {
            name: name.clone(),
            getter: Box::new(getter),
            main_cache: ConcurrentCache::new(cache_bytes),
            peers: OnceLock::new(),
            loader: SingleFlightGroup::new(),
        });
        registry().write().insert(name, group.clone());
        group
    }

    /// Looks up a previously created group by name.
    pub fn get_group(name: &str) -> Option<Arc<Group>> {
        registry().read().get(name).cloned()
    }

    /// This group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the peer picker used to dispatch remote fetches.
    ///
    /// May be called at most once; a second call is a programmer error
    /// and aborts the process.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            error::invariant_violation("RegisterPeers called more than once");
        }
    }

    /// Looks up `key`: a local cache hit returns immediately; a miss is
    /// routed through single-flight so concurrent misses for the same key
    /// trigger exactly one peer/origin load.
    ///
    /// The returned error is `Arc`-wrapped because every caller coalesced
    /// onto the same in-flight load observes the identical error value,
    /// which an owned `CacheError` (it wraps a `Box<dyn Error>`) can't be
    /// cheaply cloned into.
    pub async fn get(&self, key: &str) -> Result<ByteView, Arc<CacheError>> {
        if key.is_empty() {
            return Err(Arc::new(CacheError::InvalidKey));
        }
        if let Some(value) = self.main_cache.get(key) {
            tracing::debug!(%key, group = %self.name, "cache hit");
            return Ok(value);
        }
        tracing::debug!(%key, group = %self.name, "cache miss, loading");
        self.loader.do_call(key, || self.load(key)).await
    }

    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        if let Some(picker) = self.peers.get() {
            if let Some(peer) = picker.pick_peer(key) {
                match peer.get(&self.name, key).await {
                    Ok(bytes) => {
                        // Deliberately not populated into main_cache: see
                        // the peer-fetch caching policy in DESIGN.md.
                        return Ok(ByteView::new(bytes));
                    }
                    Err(err) => {
                        tracing::warn!(%key, group = %self.name, error = %err, "peer fetch failed, falling back to local origin");
                    }
                }
            }
        }
        self.get_locally(key).await
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        let bytes = self.getter.get(key).await.map_err(CacheError::origin_box)?;
        let value = ByteView::new(bytes);
        self.main_cache.set(key, value.clone());
        Ok(value)
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("has_peers", &self.peers.get().is_some())
            .finish()
    }
}
