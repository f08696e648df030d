//! Typed, `serde`-deserializable settings for a running node.
//!
//! A deployment needs per-group cache sizes, the ring's replica count, the
//! wire base path, and the node's own address for self-detection. This
//! module gives them a shape that can be loaded from a TOML file, or built
//! up by hand in tests, instead of hard-coded in a binary's `main`.

use serde::{Deserialize, Serialize};

/// The default wire base path new node configs mount peer routes under.
pub fn default_base_path() -> String {
    "/_mycache/".to_string()
}

/// The default replica count for the consistent-hash ring.
pub fn default_replicas() -> usize {
    50
}

/// Settings for one [`crate::group::Group`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// The group's name, unique process-wide.
    pub name: String,
    /// Byte budget for the group's local cache; 0 means unbounded.
    #[serde(default)]
    pub cache_bytes: usize,
}

/// Settings for a running peer node: its own address, the set of peers it
/// should know about, and the ring/wire parameters all peers must agree on
/// to shard keys consistently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// The address this node is reachable at, and recognizes as "self"
    /// when `PickPeer` would otherwise dispatch to itself.
    pub self_addr: String,

    /// The full set of peer addresses in the cluster, self included.
    /// All nodes must register the same set (in any order -- the ring
    /// sorts hash positions, not insertion order) to agree on ownership.
    pub peer_addrs: Vec<String>,

    /// Virtual nodes per physical peer on the consistent-hash ring.
    #[serde(default = "default_replicas")]
    pub replicas: usize,

    /// The wire base path peer requests are served under.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Groups to create at startup.
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl NodeConfig {
    /// Parses a [`NodeConfig`] from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config_with_defaults_filled_in() {
        let cfg = NodeConfig::from_toml(
            r#"
            self_addr = "http://127.0.0.1:8001"
            peer_addrs = ["http://127.0.0.1:8001", "http://127.0.0.1:8002"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.replicas, 50);
        assert_eq!(cfg.base_path, "/_mycache/");
        assert!(cfg.groups.is_empty());
    }

    #[test]
    fn parses_groups_and_overrides() {
        let cfg = NodeConfig::from_toml(
            r#"
            self_addr = "http://127.0.0.1:8001"
            peer_addrs = ["http://127.0.0.1:8001"]
            replicas = 10
            base_path = "/_peercache/"

            [[groups]]
            name = "user"
            cache_bytes = 1024
            "#,
        )
        .unwrap();
        assert_eq!(cfg.replicas, 10);
        assert_eq!(cfg.base_path, "/_peercache/");
        assert_eq!(cfg.groups.len(), 1);
        assert_eq!(cfg.groups[0].name, "user");
        assert_eq!(cfg.groups[0].cache_bytes, 1024);
    }
}
