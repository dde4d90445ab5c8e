//! Node Registry
//!
//! Owns every live node of a pipeline, keyed by handle. Handles come from a
//! per-registry counter and are retired for good when their node is removed.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::Pipeline;
use crate::error::{PipelineError, Result};
use crate::node::{AnyNode, Node, NodeId, NodeKind, Poll, SlotTypes, TypeTag};

/// A registered node together with the shape captured when it was created.
pub(crate) struct NodeEntry {
    pub(crate) node: Box<dyn AnyNode>,
    pub(crate) kind: NodeKind,
    pub(crate) inputs: SlotTypes,
    pub(crate) output: Option<TypeTag>,
    /// Status settled by the most recent tick.
    pub(crate) status: Poll,
}

impl NodeEntry {
    fn new(node: Box<dyn AnyNode>) -> Self {
        let inputs = node.input_types();
        let output = node.output_type();
        Self {
            kind: NodeKind::classify(inputs.len(), output.is_some()),
            node,
            inputs,
            output,
            status: Poll::Empty,
        }
    }
}

/// Handle-indexed storage for nodes.
///
/// Iteration order is ascending handle order: handles are issued in
/// increasing order and removal preserves the order of the rest.
pub(crate) struct NodeRegistry {
    next_id: NodeId,
    nodes: IndexMap<NodeId, NodeEntry>,
    sources: IndexSet<NodeId>,
    sinks: IndexSet<NodeId>,
}

impl NodeRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: NodeId::FIRST,
            nodes: IndexMap::new(),
            sources: IndexSet::new(),
            sinks: IndexSet::new(),
        }
    }

    /// Store a node under the next unused handle.
    pub(crate) fn insert(&mut self, node: Box<dyn AnyNode>) -> (NodeId, &NodeEntry) {
        let id = self.next_id;
        self.next_id = id.next();

        let entry = NodeEntry::new(node);
        if entry.kind.is_source() {
            self.sources.insert(id);
        }
        if entry.kind.is_sink() {
            self.sinks.insert(id);
        }

        let (index, _) = self.nodes.insert_full(id, entry);
        (id, &self.nodes[index])
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<NodeEntry> {
        let entry = self.nodes.shift_remove(&id)?;
        self.sources.shift_remove(&id);
        self.sinks.shift_remove(&id);
        Some(entry)
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes.get(&id).ok_or(PipelineError::invalid(id))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes.get_mut(&id).ok_or(PipelineError::invalid(id))
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeEntry)> + '_ {
        self.nodes.iter().map(|(id, entry)| (*id, entry))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut NodeEntry)> + '_ {
        self.nodes.iter_mut().map(|(id, entry)| (*id, entry))
    }

    pub(crate) fn sources(&self) -> &IndexSet<NodeId> {
        &self.sources
    }

    pub(crate) fn sinks(&self) -> &IndexSet<NodeId> {
        &self.sinks
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.nodes
                    .iter()
                    .map(|(id, entry)| (id.raw(), (entry.node.name(), entry.kind))),
            )
            .finish()
    }
}

impl Pipeline {
    /// Register a node and return its handle.
    ///
    /// A node with no input slots becomes a source; a node with no output
    /// becomes a sink. All of its slots start unfilled.
    pub fn create_node<N: Node>(&mut self, node: N) -> NodeId {
        let (id, entry) = self.registry.insert(Box::new(node));
        debug!(
            node = id.raw(),
            name = %entry.node.name(),
            kind = ?entry.kind,
            slots = entry.inputs.len(),
            "created node"
        );
        let arity = entry.inputs.len();
        self.connections.insert_row(id, arity);
        id
    }

    /// Build a node with a fallible constructor and register it.
    ///
    /// If `build` fails, no handle is consumed and the pipeline is unchanged.
    pub fn try_create_node<N, E, F>(&mut self, build: F) -> std::result::Result<NodeId, E>
    where
        N: Node,
        F: FnOnce() -> std::result::Result<N, E>,
    {
        let node = build()?;
        Ok(self.create_node(node))
    }

    /// Remove a node.
    ///
    /// Every slot that was fed by the node reverts to unfilled, and the
    /// consumer is told through [`Node::connect`] with no source. The handle
    /// is never issued again.
    pub fn erase_node(&mut self, id: NodeId) -> Result<()> {
        let entry = self.registry.remove(id).ok_or(PipelineError::invalid(id))?;
        let orphaned = self.connections.remove_row(id);

        for &(dependent, slot) in &orphaned {
            if let Ok(consumer) = self.registry.get_mut(dependent) {
                consumer.node.connect(None, slot);
            }
        }

        debug!(
            node = id.raw(),
            name = %entry.node.name(),
            orphaned_slots = orphaned.len(),
            "erased node"
        );
        Ok(())
    }

    /// Look up a node by handle.
    pub fn get_node(&self, id: NodeId) -> Result<&dyn Node> {
        self.registry.get(id).map(|entry| entry.node.as_node())
    }

    /// Look up a node by handle for mutation.
    pub fn get_node_mut(&mut self, id: NodeId) -> Result<&mut dyn Node> {
        self.registry.get_mut(id).map(|entry| entry.node.as_node_mut())
    }

    /// Look up a node as its concrete type.
    ///
    /// `None` if the handle is unknown or the node is not an `N`.
    pub fn get_node_as<N: Node>(&self, id: NodeId) -> Option<&N> {
        self.registry.get(id).ok()?.node.as_any().downcast_ref()
    }

    /// Mutable counterpart of [`get_node_as`](Pipeline::get_node_as).
    pub fn get_node_as_mut<N: Node>(&mut self, id: NodeId) -> Option<&mut N> {
        self.registry.get_mut(id).ok()?.node.as_any_mut().downcast_mut()
    }

    /// Whether `id` names a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.registry.contains(id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    /// Handles of all live nodes, ascending.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.registry.ids()
    }

    /// Handles of all nodes without input slots, ascending.
    pub fn sources(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.registry.sources().iter().copied()
    }

    /// Handles of all nodes without an output, ascending.
    pub fn sinks(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.registry.sinks().iter().copied()
    }

    /// Whether `id` is a live node without input slots.
    pub fn is_source(&self, id: NodeId) -> bool {
        self.registry.sources().contains(&id)
    }

    /// Whether `id` is a live node without an output.
    pub fn is_sink(&self, id: NodeId) -> bool {
        self.registry.sinks().contains(&id)
    }

    /// Shape of a node: source, component, sink or isolated.
    pub fn kind(&self, id: NodeId) -> Result<NodeKind> {
        self.registry.get(id).map(|entry| entry.kind)
    }

    /// Status of a node as settled by the most recent tick.
    ///
    /// `Poll::Empty` until the first tick runs.
    pub fn status(&self, id: NodeId) -> Option<Poll> {
        self.registry.get(id).ok().map(|entry| entry.status)
    }
}
