//! Tick Scheduler
//!
//! One tick polls every node once and then settles each node's status in
//! dependency order, so that producers are always settled before their
//! consumers.
//!
//! # Algorithm
//!
//! 1. Kahn's algorithm over the slot table gives a topological order,
//!    seeded with the sources (in-degree zero). A consumer is queued once
//!    every slot feeding it has been visited.
//! 2. Poll every node once, in that order, so a consumer reads the values its
//!    producers wrote this tick. A node's own poll result is its starting
//!    status.
//! 3. Walk the same order and push each producer's status into its
//!    dependents:
//!    - `Closed` closes the dependent
//!    - `Empty` empties the dependent (unless closed) and marks it skipped
//!    - `Ready` readies the dependent unless it is closed or skipped
//!
//! `Closed` dominates `Empty`, which dominates `Ready`: once a dependent is
//! closed or skipped, a later `Ready` producer cannot revive it this tick.
//! The tick reports completion when every sink is closed.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use super::connections::DependentsMap;
use super::Pipeline;
use crate::node::{NodeId, Poll};

impl Pipeline {
    /// Run one tick.
    ///
    /// Returns `true` if every sink is closed after the tick.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline is not [valid](Pipeline::is_valid). Running an
    /// invalid pipeline is a programming error.
    pub fn step(&mut self) -> bool {
        if let Err(defect) = self.validate() {
            panic!("step() called on an invalid pipeline: {defect}");
        }

        let dependents = self.connections.dependents_map();
        let order = self.poll_order(&dependents);

        let mut status: HashMap<NodeId, Poll> = HashMap::with_capacity(order.len());
        for &id in &order {
            if let Ok(entry) = self.registry.get_mut(id) {
                status.insert(id, entry.node.poll_next());
            }
        }

        let mut skipped: HashSet<NodeId> = HashSet::new();
        for &id in &order {
            if self.is_sink(id) {
                continue;
            }
            let Some(&current) = status.get(&id) else {
                continue;
            };
            trace!(node = id.raw(), status = ?current, "settled");

            for &(consumer, _) in dependents.get(&id).into_iter().flatten() {
                let Some(next) = status.get_mut(&consumer) else {
                    continue;
                };
                match current {
                    Poll::Closed => *next = Poll::Closed,
                    Poll::Empty => {
                        if *next != Poll::Closed {
                            *next = Poll::Empty;
                        }
                        skipped.insert(consumer);
                    }
                    Poll::Ready => {
                        if *next != Poll::Closed && !skipped.contains(&consumer) {
                            *next = Poll::Ready;
                        }
                    }
                }
            }
        }

        for (id, entry) in self.registry.iter_mut() {
            if let Some(&settled) = status.get(&id) {
                entry.status = settled;
            }
        }
        self.ticks += 1;

        let done = self
            .registry
            .sinks()
            .iter()
            .all(|sink| status.get(sink) == Some(&Poll::Closed));
        trace!(tick = self.ticks, done, skipped = skipped.len(), "tick finished");
        done
    }

    /// Topological order of every node, producers before consumers.
    ///
    /// Sources are seeded in handle order, so the order is stable between
    /// ticks.
    fn poll_order(&self, dependents: &DependentsMap) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::with_capacity(self.node_count());
        let mut queue = VecDeque::new();

        for (id, entry) in self.registry.iter() {
            let degree = self.connections.row(id).map_or(0, <[_]>::len);
            if (degree == 0) != entry.kind.is_source() {
                panic!(
                    "inconsistent pipeline state: node {id} ({:?}) has in-degree {degree}",
                    entry.kind
                );
            }
            if degree == 0 {
                queue.push_back(id);
            }
            in_degree.insert(id, degree);
        }

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &(consumer, _) in dependents.get(&id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(&consumer) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(consumer);
                    }
                }
            }
        }

        if order.len() != in_degree.len() {
            panic!(
                "inconsistent pipeline state: {} of {} nodes have no topological order",
                in_degree.len() - order.len(),
                in_degree.len()
            );
        }
        order
    }

    /// Step until every sink is closed.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline is not [valid](Pipeline::is_valid).
    pub fn run(&mut self) {
        if let Err(defect) = self.validate() {
            panic!("run() called on an invalid pipeline: {defect}");
        }
        while !self.step() {}
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
