//! Common test utilities and nodes

#![allow(dead_code)] // Not every test file uses every helper

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;

use smallvec::smallvec;
use sluice_core::{Input, Node, Output, Poll, Port, SlotTypes, TypeTag};
use tracing_subscriber::EnvFilter;

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Source replaying a fixed sequence of poll results, emitting an
/// increasing counter on every `Ready`. Closed once the script runs out.
pub struct Counter {
    script: VecDeque<Poll>,
    next: i64,
    out: Output<i64>,
}

impl Counter {
    pub fn new(script: &[Poll]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            next: 0,
            out: Output::new(),
        }
    }

    /// Ready `n` times, then closed.
    pub fn ready(n: usize) -> Self {
        Self::new(&vec![Poll::Ready; n])
    }
}

impl Node for Counter {
    fn name(&self) -> String {
        "counter".into()
    }

    fn poll_next(&mut self) -> Poll {
        let poll = self.script.pop_front().unwrap_or(Poll::Closed);
        match poll {
            Poll::Ready => {
                self.next += 1;
                self.out.set(self.next);
            }
            _ => self.out.clear(),
        }
        poll
    }

    fn output(&self) -> Option<Port> {
        Some(self.out.port())
    }
}

/// Sums its two inputs.
#[derive(Default)]
pub struct Add {
    lhs: Input<i64>,
    rhs: Input<i64>,
    out: Output<i64>,
}

impl Node for Add {
    fn name(&self) -> String {
        "add".into()
    }

    fn poll_next(&mut self) -> Poll {
        match (self.lhs.get(), self.rhs.get()) {
            (Some(a), Some(b)) => {
                self.out.set(a + b);
                Poll::Ready
            }
            _ => {
                self.out.clear();
                Poll::Empty
            }
        }
    }

    fn connect(&mut self, source: Option<&Port>, slot: usize) {
        match slot {
            0 => self.lhs.bind(source),
            _ => self.rhs.bind(source),
        };
    }

    fn input_types(&self) -> SlotTypes {
        smallvec![TypeTag::of::<i64>(); 2]
    }

    fn output(&self) -> Option<Port> {
        Some(self.out.port())
    }
}

/// Log of what a [`Collect`] sink saw.
pub type Seen = Rc<RefCell<Vec<i64>>>;

/// Sink recording every value it sees on its single slot.
pub struct Collect {
    input: Input<i64>,
    seen: Seen,
}

impl Collect {
    pub fn new() -> (Self, Seen) {
        let seen = Seen::default();
        let sink = Self {
            input: Input::new(),
            seen: Rc::clone(&seen),
        };
        (sink, seen)
    }
}

impl Node for Collect {
    fn name(&self) -> String {
        "collect".into()
    }

    fn poll_next(&mut self) -> Poll {
        match self.input.get() {
            Some(value) => {
                self.seen.borrow_mut().push(value);
                Poll::Ready
            }
            None => Poll::Empty,
        }
    }

    fn connect(&mut self, source: Option<&Port>, _slot: usize) {
        self.input.bind(source);
    }

    fn input_types(&self) -> SlotTypes {
        smallvec![TypeTag::of::<i64>()]
    }
}

/// Node with an arbitrary shape, for structural tests. Polls `Ready`.
pub struct Shape {
    name: String,
    inputs: SlotTypes,
    out: Option<Output<i64>>,
    text: Option<Output<String>>,
    pub bound: Rc<RefCell<Vec<(usize, bool)>>>,
}

impl Shape {
    fn build(name: &str, inputs: usize, output: bool) -> Self {
        Self {
            name: name.to_string(),
            inputs: smallvec![TypeTag::of::<i64>(); inputs],
            out: output.then(Output::new),
            text: None,
            bound: Rc::default(),
        }
    }

    pub fn source(name: &str) -> Self {
        Self::build(name, 0, true)
    }

    pub fn component(name: &str, inputs: usize) -> Self {
        Self::build(name, inputs, true)
    }

    pub fn sink(name: &str, inputs: usize) -> Self {
        Self::build(name, inputs, false)
    }

    /// Source producing `String` instead of `i64`.
    pub fn text_source(name: &str) -> Self {
        Self {
            out: None,
            text: Some(Output::new()),
            ..Self::build(name, 0, false)
        }
    }
}

impl Node for Shape {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn poll_next(&mut self) -> Poll {
        Poll::Ready
    }

    fn connect(&mut self, source: Option<&Port>, slot: usize) {
        self.bound.borrow_mut().push((slot, source.is_some()));
    }

    fn input_types(&self) -> SlotTypes {
        self.inputs.clone()
    }

    fn output(&self) -> Option<Port> {
        match (&self.out, &self.text) {
            (Some(out), _) => Some(out.port()),
            (None, Some(text)) => Some(text.port()),
            (None, None) => None,
        }
    }
}
