#![forbid(unsafe_code)]

//! Reactive primitives for modstack.
//!
//! - [`Observable`]: shared, version-tracked value with change notification.
//! - [`Subscription`]: RAII guard that unregisters on drop.
//! - [`Computed`]: lazily evaluated, memoized derivation of observables.
//! - [`SubscriptionScope`]: drops a group of subscriptions together.
//! - [`EventChannel`]: value-less typed pub/sub.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc<RefCell<..>>`). Sources hold
//! `Weak` references to callbacks and prune dead ones lazily, so dropping a
//! subscription never needs access to its source. No borrow is held while a
//! callback runs, which makes re-entrant `set`/`emit` from callbacks safe.

pub mod channel;
pub mod computed;
pub mod observable;
pub mod scope;

pub use channel::EventChannel;
pub use computed::Computed;
pub use observable::{Observable, Subscription};
pub use scope::SubscriptionScope;
