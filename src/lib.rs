//! A distributed, in-memory key/value cache modeled on the GeeCache /
//! groupcache design: a fleet of peer nodes that shard keys via consistent
//! hashing, each one the sole authority for the keys that hash to it.
//!
//! On a miss the owning node loads the value from a user-supplied origin,
//! populates its local [`lru`] store, and hands the bytes back; every other
//! node that asked for the same key during the load gets the same answer
//! without touching the origin a second time, courtesy of [`singleflight`].
//!
//! # Layout
//!
//! - [`lru`] / [`list`]: the byte-accounted LRU store and its backing arena.
//! - [`concurrent`]: a mutex wrapper that's the only thing allowed to touch
//!   an `LruStore`.
//! - [`hashring`]: consistent hashing with virtual nodes, mapping a key to
//!   the peer that owns it.
//! - [`singleflight`]: request coalescing for concurrent misses on one key.
//! - [`byteview`]: the immutable byte payload cached values are wrapped in.
//! - [`group`]: the coordinator that wires all of the above into `get`.
//! - [`config`]: typed, `serde`-deserializable node/group settings.
//! - [`error`]: the unified error taxonomy.
//! - [`transport`] / [`server`] (feature `peer-http`): the HTTP boundary a
//!   running node uses to talk to its peers.
//!
//! Everything up through [`group`] has no notion of HTTP; a `Group` can be
//! driven entirely in-process with [`group::PeerPicker`] left unset, which
//! is what most of this crate's tests do.

pub mod byteview;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod group;
pub mod hashring;
pub(crate) mod list;
pub mod lru;
pub mod singleflight;

#[cfg(feature = "peer-http")]
pub mod server;
#[cfg(feature = "peer-http")]
pub mod transport;

pub use byteview::ByteView;
pub use error::CacheError;
pub use group::Group;
pub use hashring::HashRing;

/// A capability for values the LRU store can charge against its byte
/// budget: "reports its own size in bytes."
///
/// [`byteview::ByteView`] is the one concrete implementation the cache
/// itself uses, but the store is generic over anything that implements
/// this, so callers can plug in their own payload type and still get
/// byte-accurate capacity accounting.
pub trait Weighted {
    /// The number of bytes this value should be charged against the
    /// store's `max_bytes` budget.
    fn weight(&self) -> usize;
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}
