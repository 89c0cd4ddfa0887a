#![forbid(unsafe_code)]

//! Lazily evaluated, memoized values derived from [`Observable`] sources.
//!
//! A `Computed<T>` subscribes to its sources and only flips a dirty flag when
//! they change. The derivation runs on the next [`Computed::get`], never
//! inline with the mutation that invalidated it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::observable::{Observable, Subscription};

struct Inner<T> {
    compute: Box<dyn Fn() -> T>,
    cache: RefCell<Option<T>>,
    dirty: Rc<Cell<bool>>,
    evaluations: Cell<u64>,
    _sources: Vec<Subscription>,
}

/// A memoized derived value.
pub struct Computed<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("cached", &self.inner.cache.borrow())
            .field("dirty", &self.inner.dirty.get())
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Derive a value from a single observable.
    pub fn from_observable<S: Clone + PartialEq + 'static>(
        source: &Observable<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let sub = source.subscribe(move |_| flag.set(true));
        let src = source.clone();
        Self {
            inner: Rc::new(Inner {
                compute: Box::new(move || src.with(|v| map(v))),
                cache: RefCell::new(None),
                dirty,
                evaluations: Cell::new(0),
                _sources: vec![sub],
            }),
        }
    }

    /// Current value, recomputing first if any source changed.
    #[must_use]
    pub fn get(&self) -> T {
        if !self.inner.dirty.get()
            && let Some(value) = self.inner.cache.borrow().as_ref()
        {
            return value.clone();
        }
        let value = (self.inner.compute)();
        self.inner.dirty.set(false);
        self.inner.evaluations.set(self.inner.evaluations.get() + 1);
        *self.inner.cache.borrow_mut() = Some(value.clone());
        value
    }

    /// Whether the next `get` will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// How many times the derivation has run.
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.inner.evaluations.get()
    }
}
