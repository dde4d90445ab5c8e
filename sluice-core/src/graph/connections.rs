//! Connection Table
//!
//! For every node, one entry per input slot naming the producer that feeds
//! it, or `None` while the slot is unfilled. Edges are stored only on the
//! consumer side; dependents of a producer are derived by scanning rows.

use std::collections::HashMap;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use super::Pipeline;
use crate::error::{PipelineError, Result};
use crate::node::NodeId;

pub(crate) type SlotRow = SmallVec<[Option<NodeId>; 4]>;

/// A consumer and the slot of it that a producer feeds.
pub type Dependency = (NodeId, usize);

/// Dependents of every node, keyed by producer.
pub(crate) type DependentsMap = HashMap<NodeId, Vec<Dependency>>;

#[derive(Debug, Default)]
pub(crate) struct ConnectionTable {
    rows: IndexMap<NodeId, SlotRow>,
}

impl ConnectionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a row of `arity` unfilled slots.
    pub(crate) fn insert_row(&mut self, id: NodeId, arity: usize) {
        self.rows.insert(id, SmallVec::from_elem(None, arity));
    }

    /// Drop a node's row and unfill every slot it was feeding.
    ///
    /// Returns the slots that were unfilled.
    pub(crate) fn remove_row(&mut self, id: NodeId) -> Vec<Dependency> {
        self.rows.shift_remove(&id);

        let mut orphaned = Vec::new();
        for (&consumer, row) in self.rows.iter_mut() {
            for (slot, entry) in row.iter_mut().enumerate() {
                if *entry == Some(id) {
                    *entry = None;
                    orphaned.push((consumer, slot));
                }
            }
        }
        orphaned
    }

    pub(crate) fn row(&self, id: NodeId) -> Option<&[Option<NodeId>]> {
        self.rows.get(&id).map(|row| row.as_slice())
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (NodeId, &[Option<NodeId>])> + '_ {
        self.rows.iter().map(|(id, row)| (*id, row.as_slice()))
    }

    pub(crate) fn source_of(&self, dst: NodeId, slot: usize) -> Option<NodeId> {
        self.rows.get(&dst)?.get(slot).copied().flatten()
    }

    pub(crate) fn bind(&mut self, dst: NodeId, slot: usize, src: NodeId) {
        if let Some(entry) = self.rows.get_mut(&dst).and_then(|row| row.get_mut(slot)) {
            *entry = Some(src);
        }
    }

    /// Unfill every slot of `dst` fed by `src`, returning the slot indices.
    pub(crate) fn unbind(&mut self, dst: NodeId, src: NodeId) -> SmallVec<[usize; 4]> {
        let mut cleared = SmallVec::new();
        if let Some(row) = self.rows.get_mut(&dst) {
            for (slot, entry) in row.iter_mut().enumerate() {
                if *entry == Some(src) {
                    *entry = None;
                    cleared.push(slot);
                }
            }
        }
        cleared
    }

    /// Consumers of `src` other than `src` itself, ascending by consumer
    /// handle then slot.
    pub(crate) fn dependents(&self, src: NodeId) -> Vec<Dependency> {
        self.rows
            .iter()
            .filter(|&(&consumer, _)| consumer != src)
            .flat_map(|(&consumer, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(_, entry)| **entry == Some(src))
                    .map(move |(slot, _)| (consumer, slot))
            })
            .collect()
    }

    /// Dependents of every node in one pass. Every row gets an entry, even
    /// when nothing consumes it.
    pub(crate) fn dependents_map(&self) -> DependentsMap {
        let mut map: DependentsMap = self.rows.keys().map(|&id| (id, Vec::new())).collect();
        for (&consumer, row) in &self.rows {
            for (slot, entry) in row.iter().enumerate() {
                if let Some(producer) = entry {
                    map.entry(*producer).or_default().push((consumer, slot));
                }
            }
        }
        map
    }
}

impl Pipeline {
    /// Feed `src`'s output into slot `slot` of `dst`.
    ///
    /// On success `dst` is handed a port to `src`'s output through
    /// [`Node::connect`](crate::node::Node::connect). On error nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidNodeId`] if either handle is unknown, `src`
    ///   is a sink or `dst` is a source
    /// - [`PipelineError::NoSuchSlot`] if `dst` has no slot `slot`
    /// - [`PipelineError::SlotAlreadyUsed`] if the slot is already fed
    /// - [`PipelineError::ConnectionTypeMismatch`] if `src`'s output type
    ///   differs from the slot's type
    pub fn connect(&mut self, src: NodeId, dst: NodeId, slot: usize) -> Result<()> {
        let producer = self.registry.get(src)?;
        let consumer = self.registry.get(dst)?;

        if producer.kind.is_sink() {
            return Err(PipelineError::invalid(src));
        }
        if consumer.kind.is_source() {
            return Err(PipelineError::invalid(dst));
        }

        let expected = *consumer.inputs.get(slot).ok_or(PipelineError::NoSuchSlot {
            node: dst,
            slot,
            arity: consumer.inputs.len(),
        })?;

        if let Some(current) = self.connections.source_of(dst, slot) {
            return Err(PipelineError::SlotAlreadyUsed {
                node: dst,
                slot,
                current,
            });
        }

        match producer.output {
            Some(found) if found == expected => {}
            Some(found) => {
                return Err(PipelineError::ConnectionTypeMismatch {
                    src,
                    dst,
                    slot,
                    expected,
                    found,
                })
            }
            None => return Err(PipelineError::invalid(src)),
        }

        let port = producer.node.output();
        self.registry.get_mut(dst)?.node.connect(port.as_ref(), slot);
        self.connections.bind(dst, slot, src);

        debug!(src = src.raw(), dst = dst.raw(), slot, "connected");
        Ok(())
    }

    /// Remove every connection from `src` into `dst`.
    ///
    /// Each unfilled slot is reported to `dst` through
    /// [`Node::connect`](crate::node::Node::connect) with no source. When the
    /// nodes are not connected this does nothing.
    pub fn disconnect(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        self.registry.get(src)?;
        let consumer = self.registry.get_mut(dst)?;

        let cleared = self.connections.unbind(dst, src);
        for &slot in &cleared {
            consumer.node.connect(None, slot);
        }

        if !cleared.is_empty() {
            debug!(src = src.raw(), dst = dst.raw(), slots = ?cleared.as_slice(), "disconnected");
        }
        Ok(())
    }

    /// Every `(consumer, slot)` fed by `src`, ascending by consumer handle
    /// then slot. A node wired into several slots of the same consumer
    /// appears once per slot. A self-loop is not listed. Always empty for
    /// sinks.
    pub fn get_dependencies(&self, src: NodeId) -> Result<Vec<Dependency>> {
        let producer = self.registry.get(src)?;
        if producer.kind.is_sink() {
            return Ok(Vec::new());
        }
        Ok(self.connections.dependents(src))
    }

    /// Producer feeding each slot of `id`, `None` where unfilled.
    pub fn slots(&self, id: NodeId) -> Result<&[Option<NodeId>]> {
        self.connections.row(id).ok_or(PipelineError::invalid(id))
    }
}
