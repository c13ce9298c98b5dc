//! Shared data structures for hoptrace.

use serde::{Deserialize, Serialize};

/// Address and hostname reported for a hop where every probe timed out.
pub const TIMEOUT: &str = "timeout";

pub const SOURCE_ID: &str = "source";
pub const DEST_ID: &str = "dest";

/// Placeholder rendered for unknown local addresses.
pub const UNKNOWN: &str = "N/A";

/// One parsed line of traceroute output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HopRecord {
    pub hop_index: u32,
    pub address: String,
    pub hostname: Option<String>,
    pub round_trip_time: Option<String>,
}

impl HopRecord {
    pub fn timeout(hop_index: u32) -> Self {
        Self {
            hop_index,
            address: TIMEOUT.to_string(),
            hostname: Some(TIMEOUT.to_string()),
            round_trip_time: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.address == TIMEOUT
    }

    pub fn node_id(&self) -> String {
        hop_node_id(self.hop_index)
    }
}

pub fn hop_node_id(hop_index: u32) -> String {
    format!("hop{hop_index}")
}

/// Inverse of [`hop_node_id`]; `None` for `source`, `dest` and foreign ids.
pub fn hop_index_of(id: &str) -> Option<u32> {
    id.strip_prefix("hop")?.parse().ok()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyEdge {
    pub source: String,
    pub target: String,
}

impl TopologyEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Discovered path, nodes in discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

impl Topology {
    pub fn node(&self, id: &str) -> Option<&TopologyNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn has_destination(&self) -> bool {
        self.contains(DEST_ID)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.source == source && edge.target == target)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Number of `hop<N>` nodes.
    pub fn hop_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| hop_index_of(&node.id).is_some())
            .count()
    }
}

/// The local end of the path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceInfo {
    pub local_ip: Option<String>,
    pub mac_address: Option<String>,
    pub hostname: Option<String>,
}

impl SourceInfo {
    pub fn label(&self) -> String {
        format!(
            "My host: {} ({})",
            self.local_ip.as_deref().unwrap_or(UNKNOWN),
            self.mac_address.as_deref().unwrap_or(UNKNOWN)
        )
    }
}
