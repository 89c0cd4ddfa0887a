#![forbid(unsafe_code)]

//! Typed, single-threaded event channel.
//!
//! Unlike [`Observable`](crate::Observable), a channel carries no current
//! value: every `emit` is delivered once to the listeners registered at that
//! moment, in registration order.
//!
//! Listeners may subscribe, unsubscribe, or emit again from inside a callback.
//! A listener added during an emission does not see that emission; a
//! listener whose subscription is dropped during an emission is skipped for
//! the rest of it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observable::Subscription;

type Listener<E> = dyn Fn(&E);

struct Inner<E> {
    listeners: Vec<Weak<Listener<E>>>,
    emitted: u64,
}

/// A cloneable handle to a shared event channel.
pub struct EventChannel<E> {
    inner: Rc<RefCell<Inner<E>>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventChannel")
            .field("listeners", &inner.listeners.len())
            .field("emitted", &inner.emitted)
            .finish()
    }
}

impl<E: 'static> EventChannel<E> {
    /// Create a channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                listeners: Vec::new(),
                emitted: 0,
            })),
        }
    }

    /// Register a listener until the returned guard is dropped.
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> Subscription {
        let listener: Rc<Listener<E>> = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&listener));
        Subscription::new(listener)
    }

    /// Deliver `event` to every live listener. Returns how many were called.
    pub fn emit(&self, event: &E) -> usize {
        let pending = {
            let mut inner = self.inner.borrow_mut();
            inner.emitted += 1;
            inner.listeners.retain(|w| w.strong_count() > 0);
            inner.listeners.clone()
        };

        let mut delivered = 0;
        for weak in pending {
            if let Some(listener) = weak.upgrade() {
                listener(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Total number of `emit` calls so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.borrow().emitted
    }

    /// Whether both handles refer to the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
