//! Pipeline Graph
//!
//! This module implements the pipeline: a directed graph of nodes whose
//! outputs feed other nodes' input slots, stepped one tick at a time.
//!
//! # Overview
//!
//! - Nodes are owned by a registry and referred to only by
//!   [`NodeId`](crate::node::NodeId).
//! - Edges live in a connection table: for each consumer, one entry per slot
//!   naming its producer. Dependents of a producer are derived from it.
//! - Validation checks that the graph is complete, connected and acyclic
//!   before it may run.
//! - The scheduler polls every node once per tick, producers before
//!   consumers, and settles statuses from sources to sinks.
//!
//! # Design Decisions
//!
//! 1. All cross references are handles, never references into the node
//!    arena, so removing a node cannot leave anything dangling.
//!
//! 2. Edges are stored once, on the consumer side. The reverse direction is
//!    rebuilt when needed instead of being kept in sync by every mutation.
//!
//! 3. Tables are insertion-ordered maps. Handles only grow, so iteration is
//!    always in ascending handle order and output is deterministic.

mod connections;
mod dot;
mod registry;
mod scheduler;
mod validate;

use std::fmt;

pub use connections::Dependency;

use connections::ConnectionTable;
use registry::NodeRegistry;

/// A graph of nodes driven tick by tick.
///
/// Pipelines are movable but not cloneable. `std::mem::take` moves the whole
/// graph out and leaves an empty pipeline behind.
pub struct Pipeline {
    registry: NodeRegistry,
    connections: ConnectionTable,
    ticks: u64,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            registry: NodeRegistry::new(),
            connections: ConnectionTable::new(),
            ticks: 0,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("nodes", &self.registry)
            .field("connections", &self.connections)
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, Poll};

    struct Inert;

    impl Node for Inert {
        fn name(&self) -> String {
            "inert".into()
        }
        fn poll_next(&mut self) -> Poll {
            Poll::Closed
        }
    }

    #[test]
    fn take_leaves_an_empty_pipeline() {
        let mut first = Pipeline::new();
        let id = first.create_node(Inert);

        let moved = std::mem::take(&mut first);
        assert_eq!(first.node_count(), 0);
        assert!(!first.is_valid());
        assert!(moved.contains(id));

        let fresh = first.create_node(Inert);
        assert_eq!(fresh.raw(), 1);
    }

    #[test]
    fn debug_lists_nodes() {
        let mut p = Pipeline::new();
        p.create_node(Inert);
        assert!(format!("{p:?}").contains("inert"));
    }
}
