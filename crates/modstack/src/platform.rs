#![forbid(unsafe_code)]

//! Host seams: the document the modals live in, the tween engine, and the
//! executor that drives detached lifecycle work.
//!
//! The core never touches a real DOM. Everything it needs from the host goes
//! through [`Document`] and [`Animator`], and every detached future (enter on
//! mount, click routing, layer signals) is handed to a
//! [`LocalSpawn`](futures::task::LocalSpawn).
//!
//! # Failure Modes
//!
//! - A spawner that refuses work (shut down pool) drops the task; the refusal
//!   is logged with `tracing::warn!` and the modal stays in its current phase.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use serde_json::Value;
use tracing::warn;

use crate::descriptor::ModalKey;

/// Opaque handle to a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a host-assigned element handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Handle returned by [`Document::add_click_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Callback invoked with the target of every document-level click.
pub type ClickListener = Rc<dyn Fn(ElementId)>;

/// Shared slot holding a container's dimmer element, if rendered.
pub type OverlaySlot = Rc<Cell<Option<ElementId>>>;

/// The host document.
pub trait Document {
    /// Add a class to the document body.
    fn add_body_class(&self, class: &str);

    /// Remove a class from the document body.
    fn remove_body_class(&self, class: &str);

    /// Whether `target` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, target: ElementId) -> bool;

    /// Evaluate a media query against the current viewport.
    fn matches_media(&self, query: &str) -> bool;

    /// Register a document-level click listener.
    fn add_click_listener(&self, listener: ClickListener) -> ListenerId;

    /// Unregister a listener. Unknown ids are ignored.
    fn remove_click_listener(&self, id: ListenerId);

    /// Root element rendered for the modal with `key`, if mounted.
    fn element_for(&self, key: &ModalKey) -> Option<ElementId> {
        let _ = key;
        None
    }

    /// Dimmer element rendered for `container`, if any.
    fn overlay_for(&self, container: &str) -> Option<ElementId> {
        let _ = container;
        None
    }
}

/// Why an animation did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// The animation was interrupted before finishing.
    Cancelled,
    /// The tween engine rejected the animation.
    Failed(String),
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "animation cancelled"),
            Self::Failed(reason) => write!(f, "animation failed: {reason}"),
        }
    }
}

impl std::error::Error for AnimationError {}

/// Future settled by the tween engine.
pub type AnimationFuture = LocalBoxFuture<'static, Result<(), AnimationError>>;

/// The tween engine.
pub trait Animator {
    /// Animate `target` with `keyframes` using `timing`. Both values are passed
    /// through from the animation configuration untouched.
    fn animate(&self, target: ElementId, keyframes: &Value, timing: &Value) -> AnimationFuture;
}

/// Everything a container needs from the host.
#[derive(Clone)]
pub struct Platform {
    pub document: Rc<dyn Document>,
    pub animator: Rc<dyn Animator>,
    pub spawner: Rc<dyn LocalSpawn>,
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

impl Platform {
    #[must_use]
    pub fn new(
        document: Rc<dyn Document>,
        animator: Rc<dyn Animator>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            document,
            animator,
            spawner,
        }
    }

    /// Run `task` detached on the host executor.
    pub(crate) fn spawn(&self, label: &'static str, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            warn!(task = label, error = %err, "spawner refused modal task");
        }
    }
}
