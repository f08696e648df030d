//! Consistent hashing with virtual nodes, for mapping cache keys to peers.
//!
//! The wire-critical detail is the virtual-key concatenation order: it is
//! `decimal(i) || physical_key`, index first. Two implementations that
//! disagree on that order will shard keys to different peers even with
//! identical hash functions and replica counts, so it is fixed here and
//! must not be changed without changing it on every node at once.

use std::collections::HashMap;

/// A hash function from arbitrary bytes to a 32-bit ring position.
pub trait RingHash {
    /// Hashes `data` to a ring position.
    fn hash(&self, data: &[u8]) -> u32;
}

/// The default ring hash: CRC32 (IEEE polynomial), chosen so ring
/// placement is identical across any implementation that also uses the
/// IEEE 802.3 CRC32 variant.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Hash;

impl RingHash for Crc32Hash {
    fn hash(&self, data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

impl<F> RingHash for F
where
    F: Fn(&[u8]) -> u32,
{
    fn hash(&self, data: &[u8]) -> u32 {
        (self)(data)
    }
}

/// A consistent-hash ring mapping physical peer keys to positions via
/// `replicas` virtual nodes each.
pub struct HashRing<H: RingHash = Crc32Hash> {
    hash: H,
    replicas: usize,
    ring: Vec<u32>,
    virtual_to_real: HashMap<u32, String>,
}

impl HashRing<Crc32Hash> {
    /// Builds a ring using the default CRC32-IEEE hash.
    pub fn new(replicas: usize) -> Self {
        HashRing::with_hash(replicas, Crc32Hash)
    }
}

impl<H: RingHash> HashRing<H> {
    /// Builds a ring using a custom hash function.
    pub fn with_hash(replicas: usize, hash: H) -> Self {
        HashRing {
            hash,
            replicas,
            ring: Vec::new(),
            virtual_to_real: HashMap::new(),
        }
    }

    /// Adds one or more physical peer keys, each expanded into `replicas`
    /// virtual nodes. The ring is re-sorted after every call.
    pub fn add(&mut self, keys: impl IntoIterator<Item = impl Into<String>>) {
        for key in keys {
            let key = key.into();
            for i in 0..self.replicas {
                let virtual_key = format!("{i}{key}");
                let hash = self.hash.hash(virtual_key.as_bytes());
                self.ring.push(hash);
                self.virtual_to_real.insert(hash, key.clone());
            }
        }
        self.ring.sort_unstable();
    }

    /// Returns the physical peer owning `key`, or `None` if the ring is
    /// empty.
    ///
    /// Finds the first ring position `>= hash(key)`, wrapping around to
    /// index 0 past the end -- the ring is circular.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        let target = self.hash.hash(key.as_bytes());
        let idx = self.ring.partition_point(|&h| h < target);
        let index = idx % self.ring.len();
        self.virtual_to_real
            .get(&self.ring[index])
            .map(String::as_str)
    }

    /// True if no physical peers have been added.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<H: RingHash> std::fmt::Debug for HashRing<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("ring_len", &self.ring.len())
            .finish()
    }
}
