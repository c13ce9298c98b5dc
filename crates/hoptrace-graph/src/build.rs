use crate::label::hop_label;
use hoptrace_model::{
    hop_index_of, hop_node_id, HopRecord, SourceInfo, Topology, TopologyEdge, TopologyNode,
    DEST_ID, SOURCE_ID,
};

/// Starts a new topology holding only the `source` node.
pub fn reset(source: &SourceInfo) -> Topology {
    Topology {
        nodes: vec![TopologyNode {
            id: SOURCE_ID.to_string(),
            label: source.label(),
            address: source.local_ip.clone(),
            hostname: source.hostname.clone(),
        }],
        edges: Vec::new(),
    }
}

/// Adds the node for `hop` and links it to its numeric neighbours.
///
/// Returns `false` when nothing changed: the hop is already known or the
/// topology was finalized. An edge to a predecessor that has not arrived
/// yet is deferred until that predecessor is applied.
pub fn apply_hop(topology: &mut Topology, hop: &HopRecord) -> bool {
    let id = hop.node_id();
    if hop.hop_index == 0 || topology.contains(&id) || topology.has_destination() {
        return false;
    }

    topology.nodes.push(TopologyNode {
        id: id.clone(),
        label: hop_label(hop),
        address: Some(hop.address.clone()),
        hostname: hop.hostname.clone(),
    });

    let predecessor = if hop.hop_index == 1 {
        SOURCE_ID.to_string()
    } else {
        hop_node_id(hop.hop_index - 1)
    };
    if topology.contains(&predecessor) {
        link(topology, &predecessor, &id);
    }

    if let Some(next) = hop.hop_index.checked_add(1) {
        let successor = hop_node_id(next);
        if topology.contains(&successor) {
            link(topology, &id, &successor);
        }
    }

    true
}

/// Closes the path with a `dest` node labelled `destination`.
///
/// The destination hangs off the highest hop seen, or `source` when no hop
/// arrived. Returns `false` if a `dest` node already exists.
pub fn finalize(topology: &mut Topology, destination: &str) -> bool {
    if topology.has_destination() {
        return false;
    }

    let last = last_known_node(topology);
    topology.nodes.push(TopologyNode {
        id: DEST_ID.to_string(),
        label: destination.to_string(),
        address: Some(destination.to_string()),
        hostname: Some(destination.to_string()),
    });
    if let Some(last) = last {
        link(topology, &last, DEST_ID);
    }
    true
}

fn last_known_node(topology: &Topology) -> Option<String> {
    topology
        .nodes
        .iter()
        .filter_map(|node| hop_index_of(&node.id).map(|index| (index, &node.id)))
        .max_by_key(|(index, _)| *index)
        .map(|(_, id)| id.clone())
        .or_else(|| {
            topology
                .contains(SOURCE_ID)
                .then(|| SOURCE_ID.to_string())
        })
}

fn link(topology: &mut Topology, source: &str, target: &str) {
    if !topology.has_edge(source, target) {
        topology.edges.push(TopologyEdge::new(source, target));
    }
}

/// Replays a full hop list through the builder.
pub fn build_topology(source: &SourceInfo, hops: &[HopRecord], destination: &str) -> Topology {
    let mut topology = reset(source);
    for hop in hops {
        apply_hop(&mut topology, hop);
    }
    finalize(&mut topology, destination);
    topology
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(index: u32, ip: &str) -> HopRecord {
        HopRecord {
            hop_index: index,
            address: ip.to_string(),
            hostname: Some(ip.to_string()),
            round_trip_time: Some("1.0 ms".to_string()),
        }
    }

    #[test]
    fn reset_has_only_source() {
        let topology = reset(&SourceInfo::default());
        assert_eq!(topology.nodes.len(), 1);
        assert_eq!(topology.nodes[0].id, SOURCE_ID);
        assert!(topology.edges.is_empty());
    }

    #[test]
    fn source_node_carries_local_hostname() {
        let source = SourceInfo {
            local_ip: Some("192.168.1.20".to_string()),
            mac_address: None,
            hostname: Some("workstation".to_string()),
        };
        let topology = reset(&source);
        assert_eq!(topology.nodes[0].hostname.as_deref(), Some("workstation"));
        assert_eq!(topology.nodes[0].address.as_deref(), Some("192.168.1.20"));
        assert_eq!(topology.nodes[0].label, "My host: 192.168.1.20 (N/A)");
    }

    #[test]
    fn finalize_on_cleared_topology_adds_lone_dest() {
        let mut topology = Topology::default();
        assert!(finalize(&mut topology, "example.com"));
        assert_eq!(topology.nodes.len(), 1);
        assert!(topology.edges.is_empty());
    }

    #[test]
    fn hops_after_finalize_are_ignored() {
        let mut topology = reset(&SourceInfo::default());
        finalize(&mut topology, "8.8.8.8");
        assert!(!apply_hop(&mut topology, &hop(1, "10.0.0.1")));
        assert_eq!(topology.nodes.len(), 2);
    }

    #[test]
    fn dest_links_from_highest_hop_not_latest_arrival() {
        let mut topology = reset(&SourceInfo::default());
        apply_hop(&mut topology, &hop(1, "10.0.0.1"));
        apply_hop(&mut topology, &hop(3, "10.0.0.3"));
        apply_hop(&mut topology, &hop(2, "10.0.0.2"));
        finalize(&mut topology, "8.8.8.8");
        assert!(topology.has_edge("hop3", DEST_ID));
        assert!(!topology.has_edge("hop2", DEST_ID));
    }
}
