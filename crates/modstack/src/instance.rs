#![forbid(unsafe_code)]

//! Lifecycle controller for one mounted modal.
//!
//! A [`ModalInstance`] moves through `Idle -> Entering -> Open -> Closing ->
//! Removed`. While open, its visual layer (active, secondary, tertiary,
//! hidden) is derived from its stack position and changed through layer
//! signals on the container's event channel.
//!
//! # Invariants
//!
//! 1. The close sequence runs at most once: `beforeRemove` is emitted, the
//!    leave transition settles, `on_close` runs, and only then is the
//!    descriptor removed from the registry.
//! 2. While `loading` (a click or action handler is in flight) further clicks
//!    and actions are ignored.
//! 3. Once `closing`, every transition except `leave` returns `None`.
//! 4. `on_open` runs at most once, after the enter transition settled with
//!    `Done` or `Ignored`.
//! 5. No `RefCell` borrow is held across an `.await`.
//!
//! # Failure Modes
//!
//! - Animator rejections settle as [`TransitionStatus::Error`] and are logged.
//! - Handler errors clear `loading` and leave the modal open.
//! - A handler that never resolves keeps the modal `loading` forever.
//! - Missing root element: transitions settle as `Ignored`, clicks are
//!   ignored.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use modstack_reactive::{Observable, SubscriptionScope};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::animation::{AnimationDef, TransitionName, TransitionStatus, builtin_animation};
use crate::bridge::{Attrs, ModalContext, extract};
use crate::descriptor::{ClickArea, CloseMode, ModalDescriptor, ModalId, ModalKey, ModalParams};
use crate::events::{ModalEmitter, ModalEvent};
use crate::options::DEFAULT_MOBILE_QUERY;
use crate::platform::{ClickListener, ElementId, ListenerId, OverlaySlot, Platform};
use crate::position::{Layer, StackPosition};
use crate::registry::ModalRegistry;

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalPhase {
    /// Created, not mounted yet.
    Idle,
    /// Mounted, enter transition in flight.
    Entering,
    /// Enter transition settled.
    Open,
    /// Close sequence in flight.
    Closing,
    /// Descriptor removed from the registry.
    Removed,
}

impl ModalPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Entering => "entering",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Removed => "removed",
        }
    }
}

/// Collaborators an instance needs besides its own descriptor.
#[derive(Clone, Debug)]
pub struct InstanceEnv {
    pub registry: ModalRegistry,
    pub platform: Platform,
    /// The owning container's dimmer element.
    pub overlay: OverlaySlot,
}

struct Inner {
    descriptor: Rc<ModalDescriptor>,
    env: InstanceEnv,
    context: RefCell<ModalContext>,
    props: RefCell<Attrs>,
    position: Observable<StackPosition>,
    displayed: Cell<Layer>,
    target: Cell<Layer>,
    element: Cell<Option<ElementId>>,
    phase: Cell<ModalPhase>,
    loading: Cell<bool>,
    closing: Cell<bool>,
    mounted: Cell<bool>,
    opened: Cell<bool>,
    listener: Cell<Option<ListenerId>>,
    scope: RefCell<SubscriptionScope>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.env.platform.document.remove_click_listener(id);
        }
    }
}

/// Handle to one modal's lifecycle controller. Clones share state.
#[derive(Clone)]
pub struct ModalInstance {
    inner: Rc<Inner>,
}

impl fmt::Debug for ModalInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalInstance")
            .field("key", self.key())
            .field("position", &self.position())
            .field("phase", &self.phase())
            .field("loading", &self.is_loading())
            .field("closing", &self.is_closing())
            .finish()
    }
}

impl ModalInstance {
    /// Build a controller for `descriptor` from the attributes its container
    /// passed down.
    #[must_use]
    pub fn new(descriptor: Rc<ModalDescriptor>, attrs: &Attrs, env: InstanceEnv) -> Self {
        let (context, props) = extract(attrs);
        let position = StackPosition::new(context.index, context.count);
        Self {
            inner: Rc::new(Inner {
                descriptor,
                env,
                context: RefCell::new(context),
                props: RefCell::new(props),
                position: Observable::new(position),
                displayed: Cell::new(position.layer()),
                target: Cell::new(position.layer()),
                element: Cell::new(None),
                phase: Cell::new(ModalPhase::Idle),
                loading: Cell::new(false),
                closing: Cell::new(false),
                mounted: Cell::new(false),
                opened: Cell::new(false),
                listener: Cell::new(None),
                scope: RefCell::new(SubscriptionScope::new()),
            }),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &Rc<ModalDescriptor> {
        &self.inner.descriptor
    }

    #[must_use]
    pub fn params(&self) -> &ModalParams {
        &self.inner.descriptor.params
    }

    #[must_use]
    pub fn key(&self) -> &ModalKey {
        &self.inner.descriptor.params.key
    }

    #[must_use]
    pub fn identifier(&self) -> &ModalId {
        &self.inner.descriptor.params.identifier
    }

    /// Pass-through attributes (everything but the reserved entries).
    #[must_use]
    pub fn props(&self) -> Attrs {
        self.inner.props.borrow().clone()
    }

    #[must_use]
    pub fn emitter(&self) -> Option<ModalEmitter> {
        self.inner.context.borrow().emitter.clone()
    }

    #[must_use]
    pub fn position(&self) -> StackPosition {
        self.inner.position.get()
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        self.inner.position.with(|p| p.layer())
    }

    /// Layer the modal currently shows; trails [`layer`](Self::layer) until
    /// the matching layer signal has been handled.
    #[must_use]
    pub fn displayed_layer(&self) -> Layer {
        self.inner.displayed.get()
    }

    /// Layer the modal was last sent to. Runs ahead of
    /// [`displayed_layer`](Self::displayed_layer) while a shift is in flight.
    #[must_use]
    pub fn target_layer(&self) -> Layer {
        self.inner.target.get()
    }

    #[must_use]
    pub fn phase(&self) -> ModalPhase {
        self.inner.phase.get()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.get()
    }

    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.inner.closing.get()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.inner.element.get()
    }

    /// Set the root element the host rendered for this modal.
    pub fn attach_element(&self, element: ElementId) {
        self.inner.element.set(Some(element));
    }

    pub fn detach_element(&self) {
        self.inner.element.set(None);
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Take fresh attributes from the container.
    pub fn update_attrs(&self, attrs: &Attrs) {
        let (context, props) = extract(attrs);
        let position = StackPosition::new(context.index, context.count);
        *self.inner.context.borrow_mut() = context;
        *self.inner.props.borrow_mut() = props;
        self.set_position(position);
    }

    pub(crate) fn set_position(&self, position: StackPosition) {
        self.inner.position.set(position);
        // Without a channel no layer signal ever arrives; the position is
        // the displayed layer.
        if self.emitter().is_none() && !self.is_closing() {
            self.inner.displayed.set(position.layer());
            self.inner.target.set(position.layer());
        }
    }

    /// Start the lifecycle: announce `added`, listen for layer signals and
    /// document clicks, then play the enter transition in the background.
    /// Calling it again is a no-op.
    pub fn mount(&self) {
        if self.inner.mounted.replace(true) {
            return;
        }
        let key = self.key().clone();
        debug!(key = %key, position = ?self.position(), "modal mount");

        if self.inner.element.get().is_none() {
            self.inner
                .element
                .set(self.inner.env.platform.document.element_for(&key));
        }
        self.inner.displayed.set(self.layer());
        self.inner.target.set(self.layer());
        if self.inner.phase.get() == ModalPhase::Idle {
            self.inner.phase.set(ModalPhase::Entering);
        }

        let emitter = self.emitter();
        if let Some(emitter) = &emitter {
            let weak = Rc::downgrade(&self.inner);
            let sub = emitter.on_layer(key.clone(), self.identifier().clone(), move |layer| {
                if let Some(inner) = weak.upgrade() {
                    inner.target.set(layer);
                    ModalInstance { inner }.spawn_layer(layer);
                }
            });
            self.inner.scope.borrow_mut().hold(sub);
        }

        let weak = Rc::downgrade(&self.inner);
        let listener: ClickListener = Rc::new(move |target| {
            if let Some(inner) = weak.upgrade() {
                ModalInstance { inner }.handle_document_click(target);
            }
        });
        let id = self.inner.env.platform.document.add_click_listener(listener);
        self.inner.listener.set(Some(id));

        if let Some(emitter) = &emitter {
            emitter.emit(&ModalEvent::Added(key));
        }

        let this = self.clone();
        self.inner.env.platform.spawn("enter", async move { this.open().await });
    }

    /// Drop the click listener and channel subscriptions. Calling it again is
    /// a no-op.
    pub fn unmount(&self) {
        if !self.inner.mounted.replace(false) {
            return;
        }
        debug!(key = %self.key(), "modal unmount");
        if let Some(id) = self.inner.listener.take() {
            self.inner.env.platform.document.remove_click_listener(id);
        }
        self.inner.scope.borrow_mut().clear();
    }

    async fn open(&self) {
        let Some(status) = self.enter().await else {
            return;
        };
        if self.is_closing() {
            return;
        }
        self.inner.phase.set(ModalPhase::Open);
        if status == TransitionStatus::Error {
            debug!(key = %self.key(), "enter failed; on_open skipped");
            return;
        }
        if !self.inner.opened.replace(true)
            && let Some(on_open) = self.params().on_open.clone()
        {
            on_open();
        }
    }

    /// Close the modal. Ignored while a close is already in flight.
    pub async fn close(&self, mode: CloseMode) {
        if self.inner.closing.replace(true) {
            return;
        }
        self.inner.phase.set(ModalPhase::Closing);
        let params = Rc::clone(&self.inner.descriptor.params);
        debug!(key = %params.key, mode = mode.as_str(), "modal closing");

        let emitter = self.emitter();
        let key = params.key.clone();
        let status = self
            .leave(move || {
                if let Some(emitter) = emitter {
                    emitter.emit(&ModalEvent::BeforeRemove(key));
                }
            })
            .await;
        trace!(key = %params.key, status = status.as_str(), "leave settled");

        if let Some(on_close) = params.on_close.clone() {
            on_close(mode);
        }
        self.inner
            .env
            .registry
            .remove_modal(&params.container, &params.identifier);
        self.inner.phase.set(ModalPhase::Removed);
    }

    /// Route a click that landed in `area`.
    pub async fn click(&self, area: ClickArea) {
        if self.is_loading() || self.is_closing() {
            return;
        }
        let params = Rc::clone(&self.inner.descriptor.params);

        if let Some(handler) = params.on_click.clone() {
            self.inner.loading.set(true);
            let outcome = handler(area).await;
            self.inner.loading.set(false);
            match outcome {
                Ok(true) => self.close(area.close_mode()).await,
                Ok(false) => {
                    if area == ClickArea::Overlay {
                        self.refuse().await;
                    }
                }
                Err(err) => {
                    warn!(key = %params.key, area = area.as_str(), error = %err, "click handler failed");
                }
            }
            return;
        }

        match area {
            ClickArea::Overlay if params.closable => self.close(CloseMode::Overlay).await,
            ClickArea::Overlay => {
                self.refuse().await;
            }
            ClickArea::Modal => {
                trace!(key = %params.key, "content click ignored");
            }
        }
    }

    /// Run the action handler for `key`. Ignored without a handler, while
    /// loading, or once closing.
    pub async fn action(&self, key: &str, data: Option<Value>) {
        let Some(handler) = self.params().on_action.clone() else {
            return;
        };
        if self.is_loading() || self.is_closing() {
            return;
        }
        self.inner.loading.set(true);
        let outcome = handler(key, data).await;
        self.inner.loading.set(false);
        match outcome {
            Ok(true) => self.close(CloseMode::Action).await,
            Ok(false) => {}
            Err(err) => {
                warn!(key = %self.key(), action = key, error = %err, "action handler failed");
            }
        }
    }

    /// Classify a document click target.
    #[must_use]
    pub fn click_area(&self, target: ElementId) -> Option<ClickArea> {
        let root = self.inner.element.get()?;
        let document = &self.inner.env.platform.document;
        if document.contains(root, target) {
            return Some(ClickArea::Modal);
        }
        let overlay = self.inner.env.overlay.get()?;
        (self.layer() == Layer::Active && document.contains(overlay, target))
            .then_some(ClickArea::Overlay)
    }

    /// Document-level click entry point; routes in the background.
    pub fn handle_document_click(&self, target: ElementId) {
        if let Some(area) = self.click_area(target) {
            let this = self.clone();
            self.inner
                .env
                .platform
                .spawn("click", async move { this.click(area).await });
        }
    }

    pub async fn enter(&self) -> Option<TransitionStatus> {
        if self.is_closing() {
            return None;
        }
        if self.layer() == Layer::Hidden {
            return Some(TransitionStatus::Ignored);
        }
        Some(self.play(self.responsive(TransitionName::Enter)).await)
    }

    /// Shake to signal a refused close.
    pub async fn refuse(&self) -> Option<TransitionStatus> {
        if self.is_closing() {
            return None;
        }
        if self.is_loading() || self.displayed_layer() == Layer::Hidden {
            return Some(TransitionStatus::Ignored);
        }
        Some(self.play(self.responsive(TransitionName::Refuse)).await)
    }

    /// Play the exit transition. `before` always runs first, even when the
    /// animation itself is skipped.
    pub async fn leave(&self, before: impl FnOnce()) -> TransitionStatus {
        before();
        if self.displayed_layer() == Layer::Hidden {
            return TransitionStatus::Ignored;
        }
        self.play(self.responsive(TransitionName::Leave)).await
    }

    pub async fn activate(&self) -> Option<TransitionStatus> {
        self.shift(Layer::Active).await
    }

    pub async fn secondary(&self) -> Option<TransitionStatus> {
        self.shift(Layer::Secondary).await
    }

    pub async fn tertiary(&self) -> Option<TransitionStatus> {
        self.shift(Layer::Tertiary).await
    }

    pub async fn hide(&self) -> Option<TransitionStatus> {
        self.shift(Layer::Hidden).await
    }

    /// Move the modal into `layer`. Skipped when it already sits in the
    /// hidden band and stays there.
    pub async fn shift(&self, layer: Layer) -> Option<TransitionStatus> {
        if self.is_closing() {
            return None;
        }
        if layer == Layer::Hidden && self.displayed_layer() == Layer::Hidden {
            return Some(TransitionStatus::Ignored);
        }
        self.inner.target.set(layer);
        let status = self.play(layer.transition()).await;
        if !self.is_closing() {
            self.inner.displayed.set(layer);
        }
        Some(status)
    }

    fn spawn_layer(&self, layer: Layer) {
        let this = self.clone();
        self.inner.env.platform.spawn("layer", async move {
            this.shift(layer).await;
        });
    }

    fn responsive(&self, name: TransitionName) -> TransitionName {
        let Some(mobile) = name.mobile_variant() else {
            return name;
        };
        let query = self
            .inner
            .context
            .borrow()
            .options
            .as_ref()
            .and_then(|options| options.mobile_query.clone())
            .unwrap_or_else(|| DEFAULT_MOBILE_QUERY.to_string());
        if self.inner.env.platform.document.matches_media(&query) {
            mobile
        } else {
            name
        }
    }

    /// Effective definition for `name`.
    #[must_use]
    pub fn animation(&self, name: TransitionName) -> AnimationDef {
        self.inner
            .context
            .borrow()
            .animations
            .as_ref()
            .and_then(|map| map.get(&name).cloned())
            .unwrap_or_else(|| builtin_animation(name))
    }

    async fn play(&self, name: TransitionName) -> TransitionStatus {
        let Some(target) = self.inner.element.get() else {
            trace!(key = %self.key(), transition = name.as_str(), "no element; transition ignored");
            return TransitionStatus::Ignored;
        };
        let def = self.animation(name);
        trace!(key = %self.key(), transition = name.as_str(), "transition start");
        let settled = self
            .inner
            .env
            .platform
            .animator
            .animate(target, &def.params, &def.options)
            .await;
        match settled {
            Ok(()) => TransitionStatus::Done,
            Err(err) => {
                warn!(key = %self.key(), transition = name.as_str(), error = %err, "transition failed");
                TransitionStatus::Error
            }
        }
    }
}
