//! Graph Validation
//!
//! A pipeline may only run when its structure is complete. The checks run in
//! this order and stop at the first failure:
//!
//! 1. Every slot of every non-source node is connected.
//! 2. Every non-sink node has at least one dependent.
//! 3. There is at least one source and at least one sink.
//! 4. The graph is one connected piece, found by a breadth-first walk from a
//!    sink that follows edges in both directions.
//! 5. The graph has no cycles. Kahn's algorithm runs over every node; any
//!    node that never reaches in-degree zero sits on or behind a cycle.
//!
//! Validation only reads structure, never node status.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use super::connections::DependentsMap;
use super::Pipeline;
use crate::error::GraphDefect;
use crate::node::NodeId;

impl Pipeline {
    /// Check that the pipeline can run, naming the first defect found.
    pub fn validate(&self) -> Result<(), GraphDefect> {
        let result = self.check_structure();
        if let Err(defect) = &result {
            debug!(%defect, "pipeline is not valid");
        }
        result
    }

    /// Whether the pipeline can run. Pure; may be called any number of times.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn check_structure(&self) -> Result<(), GraphDefect> {
        for (node, row) in self.connections.rows() {
            if let Some(slot) = row.iter().position(Option::is_none) {
                return Err(GraphDefect::UnfilledSlot { node, slot });
            }
        }

        let dependents = self.connections.dependents_map();
        for (node, entry) in self.registry.iter() {
            let consumed = dependents.get(&node).is_some_and(|deps| !deps.is_empty());
            if !entry.kind.is_sink() && !consumed {
                return Err(GraphDefect::NoDependents { node });
            }
        }

        if self.registry.sources().is_empty() {
            return Err(GraphDefect::NoSource);
        }
        let Some(&start) = self.registry.sinks().first() else {
            return Err(GraphDefect::NoSink);
        };

        let reached = self.reachable_from(start, &dependents);
        let total = self.registry.len();
        if reached < total {
            return Err(GraphDefect::Disconnected { reached, total });
        }

        let settled = self.topological_count(&dependents);
        if settled < total {
            return Err(GraphDefect::Cycle {
                remaining: total - settled,
            });
        }

        Ok(())
    }

    /// Number of nodes reachable from `start` ignoring edge direction.
    fn reachable_from(&self, start: NodeId, dependents: &DependentsMap) -> usize {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            let upstream = self
                .connections
                .row(node)
                .unwrap_or_default()
                .iter()
                .flatten()
                .copied();
            let downstream = dependents
                .get(&node)
                .into_iter()
                .flatten()
                .map(|&(consumer, _)| consumer);

            for next in upstream.chain(downstream) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited.len()
    }

    /// Number of nodes Kahn's algorithm can order. Equal to the node count
    /// exactly when the graph is acyclic.
    fn topological_count(&self, dependents: &DependentsMap) -> usize {
        let mut in_degree: HashMap<NodeId, usize> = self
            .connections
            .rows()
            .map(|(node, row)| (node, row.len()))
            .collect();
        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&node, _)| node)
            .collect();
        let mut settled = 0;

        while let Some(node) = queue.pop_front() {
            settled += 1;
            for &(consumer, _) in dependents.get(&node).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(&consumer) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(consumer);
                    }
                }
            }
        }

        settled
    }
}
