//! Sluice Core
//!
//! This crate provides the engine behind Sluice dataflow pipelines: a
//! directed graph of computation nodes, each output feeding other nodes'
//! inputs, driven one tick at a time by a cooperative polling protocol.
//!
//! It implements:
//!
//! - Node registration and removal by handle
//! - Typed, slot-based connections between nodes
//! - Structural validation (complete, connected, acyclic)
//! - A per-tick scheduler propagating `Ready`/`Empty`/`Closed` from sources
//!   to sinks
//! - Graphviz DOT export
//!
//! # Architecture
//!
//! - `node`: the [`Node`] contract and the ports values travel through
//! - `graph`: the [`Pipeline`] that owns nodes and drives them
//! - `error`: error and validation defect types
//!
//! # Example
//!
//! ```rust
//! use sluice_core::{Input, Node, Output, Pipeline, Poll, Port, SlotTypes, TypeTag};
//!
//! struct Count { n: u32, out: Output<u32> }
//!
//! impl Node for Count {
//!     fn name(&self) -> String { "count".into() }
//!     fn poll_next(&mut self) -> Poll {
//!         if self.n == 3 { return Poll::Closed; }
//!         self.n += 1;
//!         self.out.set(self.n);
//!         Poll::Ready
//!     }
//!     fn output(&self) -> Option<Port> { Some(self.out.port()) }
//! }
//!
//! #[derive(Default)]
//! struct Print { input: Input<u32> }
//!
//! impl Node for Print {
//!     fn name(&self) -> String { "print".into() }
//!     fn poll_next(&mut self) -> Poll {
//!         match self.input.get() {
//!             Some(n) => { println!("{n}"); Poll::Ready }
//!             None => Poll::Empty,
//!         }
//!     }
//!     fn connect(&mut self, source: Option<&Port>, _slot: usize) {
//!         self.input.bind(source);
//!     }
//!     fn input_types(&self) -> SlotTypes {
//!         SlotTypes::from_slice(&[TypeTag::of::<u32>()])
//!     }
//! }
//!
//! let mut pipeline = Pipeline::new();
//! let count = pipeline.create_node(Count { n: 0, out: Output::new() });
//! let print = pipeline.create_node(Print::default());
//! pipeline.connect(count, print, 0)?;
//!
//! assert!(pipeline.is_valid());
//! pipeline.run();
//! assert_eq!(pipeline.ticks(), 4);
//! # Ok::<(), sluice_core::PipelineError>(())
//! ```

pub mod error;
pub mod graph;
pub mod node;

pub use error::{GraphDefect, PipelineError, PipelineErrorKind, Result};
pub use graph::{Dependency, Pipeline};
pub use node::{Input, Node, NodeId, NodeKind, Output, Poll, Port, SlotTypes, TypeTag};
