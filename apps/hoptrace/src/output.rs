use anyhow::Result;
use hoptrace_model::Topology;
use hoptrace_session::Notification;
use serde::Serialize;
use std::io::Write;

/// Wire shape of a notification in `--json` mode, one object per line.
#[derive(Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
enum Message<'a> {
    UpdateTopology { topology: &'a Topology },
    ClearResults,
    ToggleStop { show: bool },
}

impl<'a> From<&'a Notification> for Message<'a> {
    fn from(notification: &'a Notification) -> Self {
        match notification {
            Notification::TopologyUpdated(topology) => Message::UpdateTopology { topology },
            Notification::Cleared => Message::ClearResults,
            Notification::StopToggle(show) => Message::ToggleStop { show: *show },
        }
    }
}

/// Prints notifications as they arrive.
pub struct Printer<W: Write> {
    out: W,
    json: bool,
    printed: usize,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            printed: 0,
        }
    }

    pub fn notify(&mut self, notification: &Notification) -> Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, &Message::from(notification))?;
            writeln!(self.out)?;
            return Ok(());
        }

        match notification {
            Notification::TopologyUpdated(topology) => self.print_new_nodes(topology)?,
            Notification::Cleared => {
                self.printed = 0;
                writeln!(self.out, "-- cleared")?;
            }
            Notification::StopToggle(_) => {}
        }
        Ok(())
    }

    /// Text mode only prints nodes appended since the last update; a
    /// shorter topology means it was replaced.
    fn print_new_nodes(&mut self, topology: &Topology) -> Result<()> {
        if topology.nodes.len() < self.printed {
            self.printed = 0;
        }
        for node in &topology.nodes[self.printed..] {
            writeln!(self.out, "{:<8} {}", node.id, node.label)?;
        }
        self.printed = topology.nodes.len();
        Ok(())
    }
}

pub fn print_topology<W: Write>(out: &mut W, topology: &Topology) -> Result<()> {
    for node in &topology.nodes {
        writeln!(out, "{:<8} {}", node.id, node.label)?;
    }
    for edge in &topology.edges {
        writeln!(out, "{} -> {}", edge.source, edge.target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoptrace_model::TopologyNode;

    fn topology(ids: &[&str]) -> Topology {
        Topology {
            nodes: ids
                .iter()
                .map(|id| TopologyNode {
                    id: id.to_string(),
                    label: format!("{id} label"),
                    address: None,
                    hostname: None,
                })
                .collect(),
            edges: Vec::new(),
        }
    }

    #[test]
    fn text_mode_prints_only_new_nodes() {
        let mut printer = Printer::new(Vec::new(), false);
        printer
            .notify(&Notification::TopologyUpdated(topology(&["source"])))
            .unwrap();
        printer
            .notify(&Notification::TopologyUpdated(topology(&["source", "hop1"])))
            .unwrap();
        printer.notify(&Notification::StopToggle(false)).unwrap();

        let text = String::from_utf8(printer.out).unwrap();
        assert_eq!(text, "source   source label\nhop1     hop1 label\n");
    }

    #[test]
    fn json_mode_tags_commands() {
        let mut printer = Printer::new(Vec::new(), true);
        printer.notify(&Notification::StopToggle(true)).unwrap();
        printer.notify(&Notification::Cleared).unwrap();

        let text = String::from_utf8(printer.out).unwrap();
        assert_eq!(
            text,
            "{\"command\":\"toggleStop\",\"show\":true}\n{\"command\":\"clearResults\"}\n"
        );
    }
}
