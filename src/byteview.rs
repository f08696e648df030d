//! An immutable, cheaply-cloneable view over a cached value's bytes.
//!
//! `ByteView` is what a [`crate::group::Group`] hands back from `get` and
//! what an origin [`crate::group::Getter`] hands in. It owns its bytes via
//! [`bytes::Bytes`], so clones are reference-counted rather than copied --
//! the one place callers pay a real copy is [`ByteView::to_vec`], which
//! exists specifically so external code can't mutate what the cache holds.

use bytes::Bytes;

use crate::Weighted;

/// An immutable byte payload stored in and returned from the cache.
///
/// Cloning a `ByteView` is cheap (an `Arc`-backed refcount bump via
/// [`bytes::Bytes`]); it never copies the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Builds a view that owns a copy of `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        ByteView { bytes: data.into() }
    }

    /// Number of bytes in the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the underlying bytes without copying.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns a fresh owned copy of the bytes, so the caller can't mutate
    /// what the cache is holding.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Decodes the view as UTF-8, copying into a new `String`.
    ///
    /// Invalid UTF-8 is replaced per [`String::from_utf8_lossy`]; the cache
    /// treats values as opaque bytes and does not enforce encoding.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        ByteView { bytes: Bytes::from(v) }
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        ByteView { bytes: Bytes::from(s.into_bytes()) }
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(s: &'static [u8]) -> Self {
        ByteView { bytes: Bytes::from_static(s) }
    }
}

impl Weighted for ByteView {
    fn weight(&self) -> usize {
        self.bytes.len()
    }
}
