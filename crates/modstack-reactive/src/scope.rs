#![forbid(unsafe_code)]

//! Grouped ownership of [`Subscription`]s.
//!
//! A mounted modal or a container registers callbacks on several sources;
//! a [`SubscriptionScope`] keeps all of them alive and drops them together
//! on [`clear`](SubscriptionScope::clear) or when the scope itself drops.
//! No callback held by the scope fires after that.

use std::fmt;

use crate::observable::Subscription;

/// Owner of a set of subscriptions.
#[derive(Default)]
pub struct SubscriptionScope {
    held: Vec<Subscription>,
}

impl SubscriptionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `sub` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, sub: Subscription) {
        self.held.push(sub);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Release everything now. The scope can be refilled afterwards.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("held", &self.held.len())
            .finish()
    }
}
