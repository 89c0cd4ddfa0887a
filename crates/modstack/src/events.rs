#![forbid(unsafe_code)]

//! Per-container event channel.
//!
//! Every container owns one [`ModalEmitter`]. Instances announce themselves
//! (`added`), announce their departure (`beforeRemove`) and receive layer
//! signals on it. Layer signals are addressed either by key or by identifier;
//! an instance accepts both.

use modstack_reactive::{EventChannel, Subscription};

use crate::descriptor::{ModalId, ModalKey};
use crate::position::Layer;

/// Address of a layer signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalTarget {
    Key(ModalKey),
    Identifier(ModalId),
}

impl SignalTarget {
    /// Whether this signal addresses the modal with `key` / `identifier`.
    #[must_use]
    pub fn matches(&self, key: &ModalKey, identifier: &ModalId) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Identifier(id) => id == identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    /// A modal finished mounting.
    Added(ModalKey),
    /// A modal is about to play its leave transition.
    BeforeRemove(ModalKey),
    /// Move the addressed modal into `layer`.
    Layer { target: SignalTarget, layer: Layer },
}

impl ModalEvent {
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::BeforeRemove(_) => "beforeRemove",
            Self::Layer { layer, .. } => layer.topic(),
        }
    }
}

/// Cloneable handle to a container's event channel.
#[derive(Debug, Clone, Default)]
pub struct ModalEmitter {
    channel: EventChannel<ModalEvent>,
}

impl ModalEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener. Returns how many were called.
    pub fn emit(&self, event: &ModalEvent) -> usize {
        self.channel.emit(event)
    }

    pub fn subscribe(&self, listener: impl Fn(&ModalEvent) + 'static) -> Subscription {
        self.channel.subscribe(listener)
    }

    /// Listen for layer signals addressed to one modal.
    pub fn on_layer(
        &self,
        key: ModalKey,
        identifier: ModalId,
        listener: impl Fn(Layer) + 'static,
    ) -> Subscription {
        self.channel.subscribe(move |event| {
            if let ModalEvent::Layer { target, layer } = event
                && target.matches(&key, &identifier)
            {
                listener(*layer);
            }
        })
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.channel.listener_count()
    }

    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.channel.emitted()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.channel.ptr_eq(&other.channel)
    }
}
