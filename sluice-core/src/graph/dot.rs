//! Graphviz Export
//!
//! `Display` for [`Pipeline`] writes the dependency graph in the DOT
//! language:
//!
//! ```text
//! digraph G {
//!   "1 hello"
//!   "2 world"
//!
//!   "2 world" -> "1 hello"
//! }
//! ```
//!
//! Nodes are labelled `"<id> <name>"`. Node lines come first, ascending by
//! handle, then a blank line, then one edge line per connected slot,
//! ascending by producer, consumer and slot. A producer wired into two slots
//! of the same consumer yields two identical edge lines.

use std::fmt;

use super::Pipeline;
use crate::node::NodeId;

impl Pipeline {
    fn label(&self, id: NodeId) -> String {
        match self.get_node(id) {
            Ok(node) => format!("{id} {}", node.name()),
            Err(_) => id.to_string(),
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph G {{")?;
        for id in self.node_ids() {
            writeln!(f, "  \"{}\"", self.label(id))?;
        }
        writeln!(f)?;

        let dependents = self.connections.dependents_map();
        for producer in self.node_ids() {
            let Some(consumers) = dependents.get(&producer) else {
                continue;
            };
            let mut consumers = consumers.clone();
            consumers.sort_unstable();

            let from = self.label(producer);
            for (consumer, _) in consumers {
                writeln!(f, "  \"{from}\" -> \"{}\"", self.label(consumer))?;
            }
        }
        writeln!(f, "}}")
    }
}
