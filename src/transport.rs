//! The HTTP peer transport: the client side of the wire protocol, plus a
//! consistent-hash pool of peer getters keyed by address. Only built when
//! the crate is compiled with the `peer-http` feature, since the core
//! cache has no inherent HTTP dependency of its own.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CacheError;
use crate::group::{PeerGetter, PeerPicker};
use crate::hashring::HashRing;

/// Fetches `{group}/{key}` from one specific peer over HTTP.
pub struct HttpPeerGetter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPeerGetter {
    /// `peer_addr` is a full origin like `http://10.0.0.2:8001`;
    /// `base_path` is the wire base path (default `/_mycache/`).
    pub fn new(client: reqwest::Client, peer_addr: impl Into<String>, base_path: &str) -> Self {
        let mut base_url = peer_addr.into();
        if !base_url.ends_with('/') && !base_path.starts_with('/') {
            base_url.push('/');
        }
        base_url.push_str(base_path);
        HttpPeerGetter { client, base_url }
    }
}

#[async_trait]
impl PeerGetter for HttpPeerGetter {
    async fn get(&self, group: &str, key: &str) -> Result<Vec<u8>, CacheError> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CacheError::peer)?;

        if !response.status().is_success() {
            return Err(CacheError::peer(PeerHttpError(format!(
                "server returned: {}",
                response.status()
            ))));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(CacheError::peer)
    }
}

#[derive(Debug)]
struct PeerHttpError(String);

impl std::fmt::Display for PeerHttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PeerHttpError {}

/// A [`PeerPicker`] backed by a consistent-hash ring of HTTP peers.
///
/// `self_addr` is excluded from dispatch: when the ring picks the local
/// node as owner, [`PeerPicker::pick_peer`] returns `None` so `Group::load`
/// falls through to a local origin load instead of looping a request back
/// to itself over the network.
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    client: reqwest::Client,
    ring: Mutex<HashRing>,
    getters: Mutex<HashMap<String, Arc<HttpPeerGetter>>>,
}

impl HttpPool {
    /// Builds a pool with no peers registered yet; call [`Self::set_peers`]
    /// to populate the ring.
    pub fn new(self_addr: impl Into<String>, base_path: impl Into<String>, replicas: usize) -> Self {
        HttpPool {
            self_addr: self_addr.into(),
            base_path: base_path.into(),
            replicas,
            client: reqwest::Client::new(),
            ring: Mutex::new(HashRing::new(replicas)),
            getters: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the full set of known peers, self included, and rebuilds
    /// the ring and the per-peer HTTP clients to match.
    pub fn set_peers(&self, peer_addrs: &[String]) {
        let mut ring = HashRing::new(self.replicas);
        ring.add(peer_addrs.iter().cloned());
        let getters = peer_addrs
            .iter()
            .map(|addr| {
                let getter = Arc::new(HttpPeerGetter::new(self.client.clone(), addr.clone(), &self.base_path));
                (addr.clone(), getter)
            })
            .collect();
        *self.ring.lock() = ring;
        *self.getters.lock() = getters;
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let owner = {
            let ring = self.ring.lock();
            ring.get(key)?.to_string()
        };
        if owner == self.self_addr {
            return None;
        }
        self.getters
            .lock()
            .get(&owner)
            .cloned()
            .map(|g| g as Arc<dyn PeerGetter>)
    }
}
