#![forbid(unsafe_code)]

//! In-memory host fixtures for driving modal lifecycles in tests.
//!
//! - [`MemoryDocument`]: element tree, body classes, media flag and click
//!   listeners, all in memory.
//! - [`ScriptedAnimator`]: records every animation and settles it
//!   immediately, with a scripted failure, or when the test says so.
//! - [`TestPlatform`]: both of the above plus a [`LocalPool`] that runs the
//!   detached lifecycle tasks on [`TestPlatform::settle`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use ahash::AHashMap;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future;
use serde_json::Value;

use crate::animation::{TransitionName, builtin_animation};
use crate::descriptor::ModalKey;
use crate::platform::{
    AnimationError, AnimationFuture, Animator, ClickListener, Document, ElementId, ListenerId,
    Platform,
};

/// Document double with a flat parent map standing in for the DOM tree.
#[derive(Default)]
pub struct MemoryDocument {
    parents: RefCell<AHashMap<ElementId, Option<ElementId>>>,
    next_element: Cell<u64>,
    body_classes: RefCell<BTreeSet<String>>,
    class_log: RefCell<Vec<String>>,
    listeners: RefCell<BTreeMap<ListenerId, ClickListener>>,
    next_listener: Cell<u64>,
    mobile: Cell<bool>,
    media_queries: Cell<usize>,
    modal_elements: RefCell<AHashMap<ModalKey, ElementId>>,
    overlays: RefCell<AHashMap<String, ElementId>>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("elements", &self.parents.borrow().len())
            .field("body_classes", &self.body_classes.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .field("mobile", &self.mobile.get())
            .finish()
    }
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element, optionally nested under `parent`.
    pub fn create_element(&self, parent: Option<ElementId>) -> ElementId {
        let id = ElementId::new(self.next_element.get() + 1);
        self.next_element.set(id.id());
        self.parents.borrow_mut().insert(id, parent);
        id
    }

    /// Resolve `key`'s root element to `element` on mount.
    pub fn bind_modal(&self, key: &ModalKey, element: ElementId) {
        self.modal_elements.borrow_mut().insert(key.clone(), element);
    }

    pub fn bind_overlay(&self, container: &str, element: ElementId) {
        self.overlays
            .borrow_mut()
            .insert(container.to_string(), element);
    }

    /// Make every media query match (or not).
    pub fn set_mobile(&self, mobile: bool) {
        self.mobile.set(mobile);
    }

    /// How many media queries were evaluated.
    #[must_use]
    pub fn media_queries(&self) -> usize {
        self.media_queries.get()
    }

    #[must_use]
    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.borrow().contains(class)
    }

    #[must_use]
    pub fn body_classes(&self) -> Vec<String> {
        self.body_classes.borrow().iter().cloned().collect()
    }

    /// Every body class change as `+class` / `-class`.
    #[must_use]
    pub fn class_log(&self) -> Vec<String> {
        self.class_log.borrow().clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Dispatch a click on `target` to every listener. Returns how many ran.
    pub fn click(&self, target: ElementId) -> usize {
        let listeners: Vec<ClickListener> = self.listeners.borrow().values().cloned().collect();
        for listener in &listeners {
            listener(target);
        }
        listeners.len()
    }
}

impl Document for MemoryDocument {
    fn add_body_class(&self, class: &str) {
        self.body_classes.borrow_mut().insert(class.to_string());
        self.class_log.borrow_mut().push(format!("+{class}"));
    }

    fn remove_body_class(&self, class: &str) {
        self.body_classes.borrow_mut().remove(class);
        self.class_log.borrow_mut().push(format!("-{class}"));
    }

    fn contains(&self, ancestor: ElementId, target: ElementId) -> bool {
        let parents = self.parents.borrow();
        let mut current = Some(target);
        while let Some(element) = current {
            if element == ancestor {
                return true;
            }
            current = parents.get(&element).copied().flatten();
        }
        false
    }

    fn matches_media(&self, _query: &str) -> bool {
        self.media_queries.set(self.media_queries.get() + 1);
        self.mobile.get()
    }

    fn add_click_listener(&self, listener: ClickListener) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get() + 1);
        self.next_listener.set(id.id());
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn remove_click_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().remove(&id);
    }

    fn element_for(&self, key: &ModalKey) -> Option<ElementId> {
        self.modal_elements.borrow().get(key).copied()
    }

    fn overlay_for(&self, container: &str) -> Option<ElementId> {
        self.overlays.borrow().get(container).copied()
    }
}

/// One recorded `animate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationCall {
    pub target: ElementId,
    pub keyframes: Value,
    pub timing: Value,
}

impl AnimationCall {
    /// The built-in transition whose keyframes this call used, if any.
    #[must_use]
    pub fn transition(&self) -> Option<TransitionName> {
        TransitionName::ALL
            .into_iter()
            .find(|name| builtin_animation(*name).params == self.keyframes)
    }
}

/// Animator double.
#[derive(Default)]
pub struct ScriptedAnimator {
    calls: RefCell<Vec<AnimationCall>>,
    fail: Cell<bool>,
    hold: Cell<bool>,
    pending: RefCell<VecDeque<oneshot::Sender<Result<(), AnimationError>>>>,
}

impl fmt::Debug for ScriptedAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedAnimator")
            .field("calls", &self.calls.borrow().len())
            .field("pending", &self.pending.borrow().len())
            .field("fail", &self.fail.get())
            .field("hold", &self.hold.get())
            .finish()
    }
}

impl ScriptedAnimator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every animation started from now on.
    pub fn fail_all(&self, fail: bool) {
        self.fail.set(fail);
    }

    /// Keep animations started from now on pending until completed.
    pub fn hold(&self, hold: bool) {
        self.hold.set(hold);
    }

    /// Settle the oldest pending animation successfully.
    pub fn complete_next(&self) -> bool {
        self.settle_next(Ok(()))
    }

    /// Reject the oldest pending animation.
    pub fn reject_next(&self) -> bool {
        self.settle_next(Err(AnimationError::Failed("scripted rejection".into())))
    }

    /// Settle every pending animation successfully. Returns how many.
    pub fn complete_all(&self) -> usize {
        let mut settled = 0;
        while self.complete_next() {
            settled += 1;
        }
        settled
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AnimationCall> {
        self.calls.borrow().clone()
    }

    /// Built-in transition of every call so far (`None` for custom keyframes).
    #[must_use]
    pub fn transitions(&self) -> Vec<Option<TransitionName>> {
        self.calls
            .borrow()
            .iter()
            .map(AnimationCall::transition)
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn settle_next(&self, outcome: Result<(), AnimationError>) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

impl Animator for ScriptedAnimator {
    fn animate(&self, target: ElementId, keyframes: &Value, timing: &Value) -> AnimationFuture {
        self.calls.borrow_mut().push(AnimationCall {
            target,
            keyframes: keyframes.clone(),
            timing: timing.clone(),
        });
        if self.fail.get() {
            return Box::pin(future::ready(Err(AnimationError::Failed(
                "scripted failure".into(),
            ))));
        }
        if self.hold.get() {
            let (tx, rx) = oneshot::channel();
            self.pending.borrow_mut().push_back(tx);
            return Box::pin(async move { rx.await.unwrap_or(Err(AnimationError::Cancelled)) });
        }
        Box::pin(future::ready(Ok(())))
    }
}

/// Document, animator and a local pool wired into a [`Platform`].
pub struct TestPlatform {
    pub document: Rc<MemoryDocument>,
    pub animator: Rc<ScriptedAnimator>,
    pub platform: Platform,
    pool: RefCell<LocalPool>,
}

impl fmt::Debug for TestPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestPlatform")
            .field("document", &self.document)
            .field("animator", &self.animator)
            .finish_non_exhaustive()
    }
}

impl Default for TestPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPlatform {
    #[must_use]
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let document = Rc::new(MemoryDocument::new());
        let animator = Rc::new(ScriptedAnimator::new());
        let platform = Platform::new(
            Rc::clone(&document) as Rc<dyn Document>,
            Rc::clone(&animator) as Rc<dyn Animator>,
            Rc::new(pool.spawner()),
        );
        Self {
            document,
            animator,
            platform,
            pool: RefCell::new(pool),
        }
    }

    /// Run detached tasks until none can make progress.
    pub fn settle(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Run `task` on the pool (it starts on the next [`settle`](Self::settle)).
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.platform.spawn("test", task);
    }
}
