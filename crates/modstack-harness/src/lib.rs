#![forbid(unsafe_code)]

//! Scenario harness for modstack.
//!
//! [`StackHarness`] wires a [`ModalService`], one [`ModalContainer`] and the
//! in-memory [`TestPlatform`] together so a test can open modals, click
//! around and step the async runtime without repeating the plumbing.
//!
//! Every mutating helper reconciles the container and drains the local pool
//! before returning, so assertions always see a settled stack.
//!
//! ```ignore
//! let h = StackHarness::new();
//! let a = h.open("A");
//! let b = h.open("B");
//! h.assert_layers(&[Layer::Secondary, Layer::Active]);
//! h.click_overlay();
//! assert_eq!(h.topics(), ["added", "added", "beforeRemove"]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use modstack::reactive::Subscription;
use modstack::testing::TestPlatform;
use modstack::{
    Attrs, CloseMode, ContainerConfig, CreateOptions, ElementId, Layer, ModalContainer,
    ModalContent, ModalEvent, ModalId, ModalInstance, ModalService, SimpleContent,
};
use serde_json::Value;
use tracing::trace;

/// One service, one container, one in-memory platform.
pub struct StackHarness {
    pub platform: TestPlatform,
    pub service: ModalService,
    pub container: ModalContainer,
    overlay: ElementId,
    events: Rc<RefCell<Vec<ModalEvent>>>,
    _events_sub: Option<Subscription>,
}

impl std::fmt::Debug for StackHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackHarness")
            .field("container", &self.container)
            .field("overlay", &self.overlay)
            .field("events", &self.events.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Default for StackHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl StackHarness {
    /// Harness over the default `main` container.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ModalService::default(), ContainerConfig::default())
    }

    /// Harness over `service` with a custom container configuration.
    #[must_use]
    pub fn with_config(service: ModalService, config: ContainerConfig) -> Self {
        let platform = TestPlatform::new();
        let overlay = platform.document.create_element(None);
        platform.document.bind_overlay(&config.name, overlay);
        let container = service.container(platform.platform.clone(), config);

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let events_sub = container.emitter().map(|emitter| {
            emitter.subscribe(move |event: &ModalEvent| sink.borrow_mut().push(event.clone()))
        });

        Self {
            platform,
            service,
            container,
            overlay,
            events,
            _events_sub: events_sub,
        }
    }

    /// Open a [`SimpleContent`] modal titled `title`.
    pub fn open(&self, title: &str) -> ModalId {
        self.open_with(SimpleContent::new(title), CreateOptions::new())
    }

    /// Open arbitrary content. The modal gets its own element in the
    /// document and is mounted before this returns.
    pub fn open_with(&self, content: impl ModalContent, options: CreateOptions) -> ModalId {
        let options = options.container(self.container.name());
        let id = self.service.create(content, Attrs::new(), options);
        if let Some(descriptor) = self.service.registry().modal(self.container.name(), &id) {
            let element = self.platform.document.create_element(None);
            self.platform.document.bind_modal(descriptor.key(), element);
        }
        trace!(id = %id, "harness open");
        self.sync();
        id
    }

    /// Reconcile the container and drain pending tasks.
    pub fn sync(&self) {
        self.container.reconcile();
        self.platform.settle();
        if self.container.needs_reconcile() {
            self.container.reconcile();
            self.platform.settle();
        }
    }

    /// Controller for `id`, if mounted.
    #[must_use]
    pub fn instance(&self, id: &ModalId) -> Option<ModalInstance> {
        self.container.instance(id)
    }

    /// Element bound to `id`.
    #[must_use]
    pub fn element(&self, id: &ModalId) -> Option<ElementId> {
        self.instance(id).and_then(|instance| instance.element())
    }

    #[must_use]
    pub fn overlay(&self) -> ElementId {
        self.overlay
    }

    /// Dispatch a document click on the overlay.
    pub fn click_overlay(&self) {
        self.platform.document.click(self.overlay);
        self.sync();
    }

    /// Dispatch a document click inside the modal `id`.
    pub fn click_inside(&self, id: &ModalId) {
        if let Some(root) = self.element(id) {
            let child = self.platform.document.create_element(Some(root));
            self.platform.document.click(child);
        }
        self.sync();
    }

    /// Close `id` programmatically.
    pub fn close(&self, id: &ModalId, mode: CloseMode) {
        if let Some(instance) = self.instance(id) {
            self.platform
                .spawn(async move { instance.close(mode).await });
        }
        self.sync();
    }

    /// Trigger action `key` on `id`.
    pub fn action(&self, id: &ModalId, key: &str, data: Option<Value>) {
        if let Some(instance) = self.instance(id) {
            let key = key.to_string();
            self.platform
                .spawn(async move { instance.action(&key, data).await });
        }
        self.sync();
    }

    /// Logical layer of every mounted modal, bottom to top.
    #[must_use]
    pub fn layers(&self) -> Vec<Layer> {
        self.container
            .instances()
            .iter()
            .map(ModalInstance::layer)
            .collect()
    }

    /// Layer each mounted modal last transitioned into, bottom to top.
    #[must_use]
    pub fn displayed_layers(&self) -> Vec<Layer> {
        self.container
            .instances()
            .iter()
            .map(ModalInstance::displayed_layer)
            .collect()
    }

    #[track_caller]
    pub fn assert_layers(&self, expected: &[Layer]) {
        assert_eq!(self.layers(), expected, "logical layers");
        assert_eq!(self.displayed_layers(), expected, "displayed layers");
    }

    /// Events seen on the container channel so far.
    #[must_use]
    pub fn events(&self) -> Vec<ModalEvent> {
        self.events.borrow().clone()
    }

    /// Topics of the non-layer events seen so far.
    #[must_use]
    pub fn topics(&self) -> Vec<&'static str> {
        self.events
            .borrow()
            .iter()
            .filter(|event| !matches!(event, ModalEvent::Layer { .. }))
            .map(ModalEvent::topic)
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Shared call log for handler closures.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == entry).count()
    }
}
