//! Value Ports
//!
//! A producer writes into its [`Output`]; consumers read through an [`Input`]
//! bound to a [`Port`] of that output. Everything is single-threaded: a
//! pipeline steps on one thread and nodes only touch cells during their own
//! `poll_next`.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use super::TypeTag;

type Cell<T> = RefCell<Option<T>>;

/// Type-erased handle to a producer's output cell.
#[derive(Clone)]
pub struct Port {
    tag: TypeTag,
    cell: Rc<dyn Any>,
}

impl Port {
    /// Type of the values behind this port.
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    fn downcast<T: 'static>(&self) -> Option<Rc<Cell<T>>> {
        if !self.tag.is::<T>() {
            return None;
        }
        Rc::clone(&self.cell).downcast::<Cell<T>>().ok()
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port").field("type", &self.tag.name()).finish()
    }
}

/// The producing end of a typed value cell.
pub struct Output<T: 'static> {
    cell: Rc<Cell<T>>,
}

impl<T: 'static> Output<T> {
    /// Create an output holding no value.
    pub fn new() -> Self {
        Self {
            cell: Rc::new(RefCell::new(None)),
        }
    }

    /// Publish a value for this tick, replacing the previous one.
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = Some(value);
    }

    /// Withdraw the current value.
    pub fn clear(&self) {
        self.cell.borrow_mut().take();
    }

    /// Borrow the current value, if one is published.
    pub fn get(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.cell.borrow(), Option::as_ref).ok()
    }

    /// Hand out a port consumers can bind to.
    pub fn port(&self) -> Port {
        Port {
            tag: TypeTag::of::<T>(),
            cell: Rc::clone(&self.cell) as Rc<dyn Any>,
        }
    }
}

impl<T: 'static> Default for Output<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("type", &std::any::type_name::<T>())
            .field("has_value", &self.cell.borrow().is_some())
            .finish()
    }
}

/// The consuming end of a typed value cell.
pub struct Input<T: 'static> {
    cell: Option<Rc<Cell<T>>>,
}

impl<T: 'static> Input<T> {
    /// Create an unbound input.
    pub fn new() -> Self {
        Self { cell: None }
    }

    /// Bind to `port`, or unbind when `port` is `None`.
    ///
    /// Returns whether the input is bound afterwards. A port carrying a
    /// different type leaves the input unbound.
    pub fn bind(&mut self, port: Option<&Port>) -> bool {
        self.cell = port.and_then(Port::downcast::<T>);
        self.cell.is_some()
    }

    /// Whether a producer is bound.
    pub fn is_bound(&self) -> bool {
        self.cell.is_some()
    }

    /// Run `f` on the upstream value, if bound and present.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let cell = self.cell.as_ref()?;
        let value = cell.borrow();
        value.as_ref().map(f)
    }
}

impl<T: Clone + 'static> Input<T> {
    /// Copy of the upstream value, if bound and present.
    pub fn get(&self) -> Option<T> {
        self.with(T::clone)
    }
}

impl<T: 'static> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("type", &std::any::type_name::<T>())
            .field("bound", &self.is_bound())
            .finish()
    }
}
