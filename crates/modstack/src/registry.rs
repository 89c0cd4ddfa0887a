#![forbid(unsafe_code)]

//! Registry of open modals, bucketed by container name.
//!
//! The registry is the only shared mutable state in the crate. Each container
//! bucket is an ordered [`ModalStack`] held in an [`Observable`], so container
//! controllers derive their views from it and get invalidated on change.
//!
//! # Invariants
//!
//! - Insertion order is z-order: the last modal is the active one.
//! - Identifiers are unique within a container; re-adding an identifier
//!   replaces the descriptor in place and keeps its position.
//! - Removal preserves the relative order of the remaining modals.
//!
//! # Failure Modes
//!
//! - Removing an unknown identifier (or from an unknown container) is a no-op
//!   that returns `false`.
//! - Reading an unknown container yields an empty view; the bucket is created
//!   lazily so later additions still reach that view.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use indexmap::IndexMap;
use modstack_reactive::{Computed, Observable, Subscription};
use serde_json::Value;
use tracing::debug;

use crate::descriptor::{ModalDescriptor, ModalId, ModalKey};
use crate::options::{OptionsPatch, json_kind};

/// Snapshot of one container's modals in z-order.
pub type ModalList = Vec<Rc<ModalDescriptor>>;

/// Ordered modals of one container.
#[derive(Clone, Default)]
pub struct ModalStack {
    entries: IndexMap<ModalId, Rc<ModalDescriptor>>,
}

impl PartialEq for ModalStack {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && Rc::ptr_eq(va, vb))
    }
}

impl fmt::Debug for ModalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl ModalStack {
    /// Number of modals.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, identifier: &ModalId) -> bool {
        self.entries.contains_key(identifier)
    }

    #[must_use]
    pub fn get(&self, identifier: &ModalId) -> Option<&Rc<ModalDescriptor>> {
        self.entries.get(identifier)
    }

    /// Z-order index of `identifier`.
    #[must_use]
    pub fn position(&self, identifier: &ModalId) -> Option<usize> {
        self.entries.get_index_of(identifier)
    }

    /// The active modal.
    #[must_use]
    pub fn top(&self) -> Option<&Rc<ModalDescriptor>> {
        self.entries.last().map(|(_, descriptor)| descriptor)
    }

    /// Key of the active modal.
    #[must_use]
    pub fn top_key(&self) -> Option<ModalKey> {
        self.top().map(|descriptor| descriptor.key().clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<ModalDescriptor>> {
        self.entries.values()
    }

    #[must_use]
    pub fn to_list(&self) -> ModalList {
        self.entries.values().cloned().collect()
    }

    fn insert(&mut self, descriptor: Rc<ModalDescriptor>) {
        self.entries
            .insert(descriptor.identifier().clone(), descriptor);
    }

    fn remove(&mut self, identifier: &ModalId) -> Option<Rc<ModalDescriptor>> {
        self.entries.shift_remove(identifier)
    }
}

#[derive(Default)]
struct RegistryInner {
    stacks: AHashMap<String, Observable<ModalStack>>,
    options: AHashMap<String, OptionsPatch>,
}

/// Shared handle to the modal registry. Clones share state.
#[derive(Clone, Default)]
pub struct ModalRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl fmt::Debug for ModalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModalRegistry")
            .field("containers", &inner.stacks.len())
            .field("options", &inner.options.len())
            .finish()
    }
}

impl ModalRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the override for `container`, or clear it with `None`.
    pub fn set_options(&self, container: &str, patch: Option<OptionsPatch>) {
        let mut inner = self.inner.borrow_mut();
        match patch {
            Some(patch) => {
                inner.options.insert(container.to_string(), patch);
            }
            None => {
                inner.options.remove(container);
            }
        }
    }

    /// Store an override from raw JSON. Anything that is not a well-formed
    /// option object clears the override.
    pub fn set_options_json(&self, container: &str, value: &Value) {
        match OptionsPatch::from_json_value(value) {
            Ok(patch) => self.set_options(container, Some(patch)),
            Err(err) => {
                debug!(
                    container,
                    kind = json_kind(value),
                    error = %err,
                    "clearing container options"
                );
                self.set_options(container, None);
            }
        }
    }

    /// Override for `container`; empty when none is stored.
    #[must_use]
    pub fn options(&self, container: &str) -> OptionsPatch {
        self.inner
            .borrow()
            .options
            .get(container)
            .cloned()
            .unwrap_or_default()
    }

    /// Insert `descriptor`, or replace the one with the same identifier in
    /// place.
    pub fn add_modal(&self, container: &str, descriptor: ModalDescriptor) {
        let descriptor = Rc::new(descriptor);
        debug!(container, key = %descriptor.key(), "registry add");
        self.stack(container)
            .update(move |stack| stack.insert(descriptor));
    }

    /// Remove the modal with `identifier`. Returns whether it was present.
    pub fn remove_modal(&self, container: &str, identifier: &ModalId) -> bool {
        let Some(stack) = self.existing_stack(container) else {
            return false;
        };
        let mut removed = false;
        stack.update(|stack| removed = stack.remove(identifier).is_some());
        if removed {
            debug!(container, identifier = %identifier, "registry remove");
        }
        removed
    }

    /// Live, lazily recomputed list of `container`'s modals.
    #[must_use]
    pub fn container_modals(&self, container: &str) -> Computed<ModalList> {
        Computed::from_observable(&self.stack(container), ModalStack::to_list)
    }

    /// Snapshot of `container`'s stack.
    #[must_use]
    pub fn snapshot(&self, container: &str) -> ModalStack {
        self.existing_stack(container)
            .map(|stack| stack.get())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn count(&self, container: &str) -> usize {
        self.existing_stack(container)
            .map_or(0, |stack| stack.with(ModalStack::depth))
    }

    #[must_use]
    pub fn modal(&self, container: &str, identifier: &ModalId) -> Option<Rc<ModalDescriptor>> {
        self.existing_stack(container)
            .and_then(|stack| stack.with(|s| s.get(identifier).cloned()))
    }

    /// Names of every container seen so far, sorted.
    #[must_use]
    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().stacks.keys().cloned().collect();
        names.sort();
        names
    }

    /// Call `callback` after every change to `container`'s stack.
    pub fn watch(
        &self,
        container: &str,
        callback: impl Fn(&ModalStack) + 'static,
    ) -> Subscription {
        self.stack(container).subscribe(callback)
    }

    pub(crate) fn stack(&self, container: &str) -> Observable<ModalStack> {
        if let Some(stack) = self.existing_stack(container) {
            return stack;
        }
        let stack = Observable::new(ModalStack::default());
        self.inner
            .borrow_mut()
            .stacks
            .insert(container.to_string(), stack.clone());
        stack
    }

    fn existing_stack(&self, container: &str) -> Option<Observable<ModalStack>> {
        self.inner.borrow().stacks.get(container).cloned()
    }
}
