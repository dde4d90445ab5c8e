//! Pipeline Nodes
//!
//! This module defines the contract every computation in a pipeline
//! implements, and the handle type the pipeline uses to refer to it.
//!
//! # Overview
//!
//! A node has:
//!
//! - a human-readable name
//! - zero or more typed input slots (zero means the node is a *source*)
//! - an optional typed output (none means the node is a *sink*)
//! - a poll operation reporting whether it produced a value this tick
//!
//! Values move between nodes through [`Port`]s. A producer owns an
//! [`Output`] cell and hands out ports to it; the pipeline passes a
//! producer's port to each consumer's [`Node::connect`] so the consumer can
//! bind one of its [`Input`]s.

mod port;

use std::any::{self, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

pub use port::{Input, Output, Port};

/// Handle to a node inside one [`Pipeline`](crate::graph::Pipeline).
///
/// Handles are issued in strictly increasing order starting at 1 and are
/// never reused. The default handle (0) is never issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// The first handle a pipeline issues.
    pub(crate) const FIRST: NodeId = NodeId(1);

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this is the default "no handle" value.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The result of polling a node for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Poll {
    /// A value is available.
    Ready,

    /// No value this time, but there might be one later.
    #[default]
    Empty,

    /// No value, and there never will be again. Every later poll of this
    /// node reports `Closed` too.
    Closed,
}

impl Poll {
    /// `true` for [`Poll::Ready`].
    pub fn is_ready(self) -> bool {
        self == Poll::Ready
    }

    /// `true` for [`Poll::Empty`].
    pub fn is_empty(self) -> bool {
        self == Poll::Empty
    }

    /// `true` for [`Poll::Closed`].
    pub fn is_closed(self) -> bool {
        self == Poll::Closed
    }
}

/// Stable, comparable token for a value type.
///
/// Two tags are equal when they were built from the same Rust type; the type
/// name is carried only for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag for the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Name of the tagged type, as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared types of a node's input slots, in slot order.
pub type SlotTypes = SmallVec<[TypeTag; 4]>;

/// Shape of a node, derived from its declared inputs and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No inputs, has an output. The roots of the graph.
    Source,

    /// Has inputs and an output.
    Component,

    /// Has inputs, no output. The leaves of the graph.
    Sink,

    /// No inputs and no output. Both a source and a sink; only valid as the
    /// single node of a pipeline.
    Isolated,
}

impl NodeKind {
    /// Kind of a node with `arity` input slots, with or without an output.
    pub fn classify(arity: usize, has_output: bool) -> Self {
        match (arity == 0, has_output) {
            (true, true) => NodeKind::Source,
            (false, true) => NodeKind::Component,
            (false, false) => NodeKind::Sink,
            (true, false) => NodeKind::Isolated,
        }
    }

    /// Sources and isolated nodes.
    pub fn is_source(self) -> bool {
        matches!(self, NodeKind::Source | NodeKind::Isolated)
    }

    /// Sinks and isolated nodes.
    pub fn is_sink(self) -> bool {
        matches!(self, NodeKind::Sink | NodeKind::Isolated)
    }
}

/// A unit of computation driven by a pipeline.
///
/// Implementations must not assume anything about the order in which nodes
/// at the same depth are polled, only that every producer feeding a node has
/// been polled earlier in the same tick.
pub trait Node: 'static {
    /// Human-readable name, used in the DOT export.
    fn name(&self) -> String;

    /// Advance by one tick. Called exactly once per node per tick.
    fn poll_next(&mut self) -> Poll;

    /// Bind `source` as the input for `slot`, or unbind it when `source` is
    /// `None`. The pipeline only calls this with a slot index in range and a
    /// port whose type matches the slot.
    fn connect(&mut self, source: Option<&Port>, slot: usize) {
        let _ = (source, slot);
    }

    /// Declared type of every input slot. Empty for sources.
    fn input_types(&self) -> SlotTypes {
        SlotTypes::new()
    }

    /// Port to this node's output cell. `None` for sinks.
    fn output(&self) -> Option<Port> {
        None
    }

    /// Declared output type, if any.
    fn output_type(&self) -> Option<TypeTag> {
        self.output().map(|port| port.type_tag())
    }
}

/// A [`Node`] as stored by the pipeline: still callable through the trait,
/// and recoverable as its concrete type.
pub(crate) trait AnyNode: Node {
    fn as_node(&self) -> &dyn Node;
    fn as_node_mut(&mut self) -> &mut dyn Node;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<N: Node> AnyNode for N {
    fn as_node(&self) -> &dyn Node {
        self
    }

    fn as_node_mut(&mut self) -> &mut dyn Node {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
