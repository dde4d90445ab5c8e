//! Error Types
//!
//! Two kinds of failure exist in a pipeline:
//!
//! - [`PipelineError`]: a mutation or lookup was refused. The graph is left
//!   exactly as it was before the call.
//! - [`GraphDefect`]: the graph is structurally unfit to run. Reported by
//!   [`Pipeline::validate`](crate::graph::Pipeline::validate).

use thiserror::Error;

use crate::node::{NodeId, TypeTag};

/// Field-less discriminant of a [`PipelineError`], for matching on the kind
/// of failure without caring about the handles involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineErrorKind {
    InvalidNodeId,
    NoSuchSlot,
    SlotAlreadyUsed,
    ConnectionTypeMismatch,
}

/// Errors returned by graph construction and lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The handle is unknown, or names a node that cannot play the requested
    /// role (a sink used as a producer, a source used as a consumer).
    #[error("invalid node ID")]
    InvalidNodeId { id: NodeId },

    /// The slot index is out of range for the consumer's input arity.
    #[error("no such slot")]
    NoSuchSlot { node: NodeId, slot: usize, arity: usize },

    /// The slot is already fed by another producer.
    #[error("slot already used")]
    SlotAlreadyUsed {
        node: NodeId,
        slot: usize,
        current: NodeId,
    },

    /// The producer's output type differs from the slot's declared type.
    #[error("connection type mismatch")]
    ConnectionTypeMismatch {
        src: NodeId,
        dst: NodeId,
        slot: usize,
        expected: TypeTag,
        found: TypeTag,
    },
}

impl PipelineError {
    /// Which kind of error this is, without its details.
    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::InvalidNodeId { .. } => PipelineErrorKind::InvalidNodeId,
            Self::NoSuchSlot { .. } => PipelineErrorKind::NoSuchSlot,
            Self::SlotAlreadyUsed { .. } => PipelineErrorKind::SlotAlreadyUsed,
            Self::ConnectionTypeMismatch { .. } => PipelineErrorKind::ConnectionTypeMismatch,
        }
    }

    pub(crate) fn invalid(id: NodeId) -> Self {
        Self::InvalidNodeId { id }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// A structural reason why a pipeline cannot run.
///
/// Checks are ordered; the first failing one is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphDefect {
    #[error("slot {slot} of node {node} is not connected")]
    UnfilledSlot { node: NodeId, slot: usize },

    #[error("node {node} produces a value nothing consumes")]
    NoDependents { node: NodeId },

    #[error("pipeline has no source node")]
    NoSource,

    #[error("pipeline has no sink node")]
    NoSink,

    #[error("pipeline is split into several parts: {reached} of {total} nodes reachable from a sink")]
    Disconnected { reached: usize, total: usize },

    #[error("pipeline contains a cycle through {remaining} node(s)")]
    Cycle { remaining: usize },
}
