//! Unified error taxonomy for the cache core and its HTTP boundary.
//!
//! Every recoverable failure mode a `Group` or the peer transport can
//! produce is a variant here, flowing back to the caller as an ordinary
//! `Result`. A construction-time programmer error (registering peers
//! twice) is not a variant at all -- [`invariant_violation`] panics
//! immediately instead, since there is no caller that could recover from it.

use std::fmt;

/// Errors produced by the cache core and its HTTP peer boundary.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// `Group::get` was called with an empty key.
    #[error("key is required")]
    InvalidKey,

    /// The origin getter returned an error. Not cached; returned to the
    /// caller unchanged.
    #[error("origin load failed: {0}")]
    Origin(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A peer RPC failed (network error or non-success status). Logged and
    /// swallowed by `Group::load`, which falls through to a local origin
    /// load -- so this variant is rarely seen by callers of `Group::get`,
    /// but `PeerGetter::get` implementations return it.
    #[error("peer fetch failed: {0}")]
    Peer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server handler received a request for an unregistered group.
    /// Maps to HTTP 404 at the boundary.
    #[error("no such group: {0}")]
    GroupNotFound(String),

    /// The server handler received a request whose path did not split into
    /// exactly two non-empty segments after the base path. Maps to HTTP 400.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl CacheError {
    /// Wraps an arbitrary origin-getter failure.
    pub fn origin<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Origin(Box::new(err))
    }

    /// Wraps an already-boxed origin-getter failure, as returned by
    /// [`crate::group::Getter::get`].
    pub fn origin_box(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CacheError::Origin(err)
    }

    /// Wraps an arbitrary peer-transport failure.
    pub fn peer<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Peer(Box::new(err))
    }
}

/// A thin wrapper so origin getters can return a plain message without
/// defining their own error type.
#[derive(Debug)]
pub struct Message(pub String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message(s.to_string())
    }
}

/// Panics to signal a construction-time invariant violation, such as a
/// second call to `register_peers`.
///
/// This is a programmer error the type system can't rule out, not a
/// condition a caller is expected to recover from at runtime.
#[track_caller]
pub fn invariant_violation(reason: &str) -> ! {
    panic!("invariant violation: {reason}")
}
