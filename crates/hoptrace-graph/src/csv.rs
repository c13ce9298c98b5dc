use hoptrace_model::Topology;

pub const CSV_HEADER: &str = "NodeID,Label";

/// One `NodeID,Label` row per node in discovery order. Edges are not
/// exported.
pub fn export_csv(topology: &Topology) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for node in &topology.nodes {
        csv.push_str(&escape(&node.id));
        csv.push(',');
        csv.push_str(&escape(&node.label));
        csv.push('\n');
    }
    csv
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_topology_is_header_only() {
        assert_eq!(export_csv(&Topology::default()), "NodeID,Label\n");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(escape("plain label"), "plain label");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
