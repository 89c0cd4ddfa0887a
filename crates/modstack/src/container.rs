#![forbid(unsafe_code)]

//! Container controller: binds one named registry bucket to the document.
//!
//! A [`ModalContainer`] derives its view (count, active key) from the
//! registry, keeps a merged option set for its modals, owns the event channel
//! the modals talk on, toggles the body marker class, and reconciles mounted
//! [`ModalInstance`]s with the registry.
//!
//! # Invariants
//!
//! 1. The registry override and the local merged config are written together
//!    on every options change.
//! 2. The body class is present iff the container holds a modal and a class
//!    is configured; a class change removes the old class first.
//! 3. After `reconcile`, there is exactly one instance per registered
//!    descriptor, in registry order.
//! 4. A closing modal no longer counts toward its siblings' layers.
//! 5. A sibling is signalled only when its layer changes.
//!
//! # Failure Modes
//!
//! - Forgetting to call [`ModalContainer::reconcile`] after a registry change
//!   leaves new modals unmounted; [`ModalContainer::needs_reconcile`] reports
//!   it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use modstack_reactive::{SubscriptionScope, Computed, Observable, Subscription};
use tracing::debug;

use crate::bridge::{Attrs, ModalContext, inject};
use crate::descriptor::{ModalDescriptor, ModalId, ModalKey};
use crate::events::{ModalEmitter, ModalEvent, SignalTarget};
use crate::factory::DEFAULT_CONTAINER;
use crate::instance::{InstanceEnv, ModalInstance};
use crate::options::{DefaultOptions, ModalOptions, OptionsPatch};
use crate::platform::{ElementId, OverlaySlot, Platform};
use crate::position::{StackPosition, layer_class};
use crate::registry::{ModalList, ModalRegistry, ModalStack};
use crate::service::ModalService;

/// Container construction options.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Registry bucket to bind.
    pub name: String,
    /// Changing options source; `None` uses the defaults until
    /// [`ModalContainer::set_options`] is called.
    pub options: Option<Observable<Option<OptionsPatch>>>,
    /// Whether the container owns an event channel. Without one (the raw
    /// variant) modals get no layer signals and layers are CSS-only.
    pub signals: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONTAINER.to_string(),
            options: None,
            signals: true,
        }
    }
}

impl ContainerConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Follow a changing options source.
    #[must_use]
    pub fn options_source(mut self, source: Observable<Option<OptionsPatch>>) -> Self {
        self.options = Some(source);
        self
    }

    /// Use a fixed options override.
    #[must_use]
    pub fn options(mut self, patch: OptionsPatch) -> Self {
        self.options = Some(Observable::new(Some(patch)));
        self
    }

    /// Disable the event channel.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.signals = false;
        self
    }
}

struct Inner {
    name: String,
    registry: ModalRegistry,
    defaults: DefaultOptions,
    platform: Platform,
    stack: Observable<ModalStack>,
    modals: Computed<ModalList>,
    source: Observable<Option<OptionsPatch>>,
    config: RefCell<ModalOptions>,
    emitter: Option<ModalEmitter>,
    overlay: OverlaySlot,
    instances: RefCell<Vec<ModalInstance>>,
    applied_class: RefCell<Option<String>>,
    scope: RefCell<SubscriptionScope>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.scope.get_mut().clear();
        for instance in self.instances.get_mut().drain(..) {
            instance.unmount();
        }
        if let Some(class) = self.applied_class.get_mut().take() {
            self.platform.document.remove_body_class(&class);
        }
    }
}

/// Handle to a container controller. Clones share state; the controller is
/// torn down when the last handle drops.
#[derive(Clone)]
pub struct ModalContainer {
    inner: Rc<Inner>,
}

impl fmt::Debug for ModalContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalContainer")
            .field("name", &self.inner.name)
            .field("count", &self.count())
            .field("mounted", &self.inner.instances.borrow().len())
            .field("signals", &self.inner.emitter.is_some())
            .finish()
    }
}

impl ModalContainer {
    #[must_use]
    pub fn new(service: &ModalService, platform: Platform, config: ContainerConfig) -> Self {
        let ContainerConfig {
            name,
            options,
            signals,
        } = config;
        let registry = service.registry().clone();
        let defaults = service.defaults().clone();
        let stack = registry.stack(&name);
        let modals = Computed::from_observable(&stack, ModalStack::to_list);
        let overlay = Rc::new(Cell::new(platform.document.overlay_for(&name)));

        let container = Self {
            inner: Rc::new(Inner {
                config: RefCell::new(defaults.get()),
                name,
                registry,
                defaults,
                platform,
                stack,
                modals,
                source: options.unwrap_or_default(),
                emitter: signals.then(ModalEmitter::new),
                overlay,
                instances: RefCell::new(Vec::new()),
                applied_class: RefCell::new(None),
                scope: RefCell::new(SubscriptionScope::new()),
            }),
        };
        container.apply_options();
        container.bind();
        debug!(container = %container.inner.name, signals, "container created");
        container
    }

    fn bind(&self) {
        let mut scope = self.inner.scope.borrow_mut();
        scope.hold(
            self.inner
                .source
                .subscribe(self.callback(|container: &Self, _: &Option<OptionsPatch>| {
                    container.apply_options();
                })),
        );
        scope.hold(
            self.inner
                .defaults
                .subscribe(self.callback(|container: &Self, _: &ModalOptions| {
                    container.apply_options();
                })),
        );
        scope.hold(
            self.inner
                .stack
                .subscribe(self.callback(|container: &Self, _: &ModalStack| {
                    container.sync_body_class();
                })),
        );
        if let Some(emitter) = &self.inner.emitter {
            scope.hold(emitter.subscribe(self.callback(Self::on_event)));
        }
    }

    /// Wrap `f` so it only runs while the controller is alive.
    fn callback<T: ?Sized + 'static>(
        &self,
        f: impl Fn(&Self, &T) + 'static,
    ) -> impl Fn(&T) + 'static {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        move |value: &T| {
            if let Some(inner) = weak.upgrade() {
                f(&Self { inner }, value);
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current modals in z-order.
    #[must_use]
    pub fn modals(&self) -> ModalList {
        self.inner.modals.get()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.modals.get().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Key of the active (last) modal.
    #[must_use]
    pub fn active_id(&self) -> Option<ModalKey> {
        self.inner
            .modals
            .get()
            .last()
            .map(|descriptor| descriptor.key().clone())
    }

    /// Merged options handed to this container's modals.
    #[must_use]
    pub fn config(&self) -> ModalOptions {
        self.inner.config.borrow().clone()
    }

    #[must_use]
    pub fn emitter(&self) -> Option<ModalEmitter> {
        self.inner.emitter.clone()
    }

    /// Replace the container's options override.
    pub fn set_options(&self, patch: Option<OptionsPatch>) {
        self.inner.source.set(patch);
    }

    #[must_use]
    pub fn options_source(&self) -> Observable<Option<OptionsPatch>> {
        self.inner.source.clone()
    }

    /// Register (or clear) the dimmer element.
    pub fn set_overlay(&self, overlay: Option<ElementId>) {
        self.inner.overlay.set(overlay);
    }

    #[must_use]
    pub fn overlay(&self) -> Option<ElementId> {
        self.inner.overlay.get()
    }

    /// Raw-variant class for the modal at `index`.
    #[must_use]
    pub fn layer_class(&self, index: usize) -> &'static str {
        layer_class(index, self.count())
    }

    /// Mounted instances in z-order.
    #[must_use]
    pub fn instances(&self) -> Vec<ModalInstance> {
        self.inner.instances.borrow().clone()
    }

    #[must_use]
    pub fn instance(&self, identifier: &ModalId) -> Option<ModalInstance> {
        self.inner
            .instances
            .borrow()
            .iter()
            .find(|instance| instance.identifier() == identifier)
            .cloned()
    }

    #[must_use]
    pub fn active_instance(&self) -> Option<ModalInstance> {
        self.inner.instances.borrow().last().cloned()
    }

    /// Whether the mounted instances lag behind the registry.
    #[must_use]
    pub fn needs_reconcile(&self) -> bool {
        let instances = self.inner.instances.borrow();
        self.inner.stack.with(|stack| {
            stack.depth() != instances.len()
                || stack
                    .iter()
                    .zip(instances.iter())
                    .any(|(descriptor, instance)| !Rc::ptr_eq(descriptor, instance.descriptor()))
        })
    }

    /// Call `callback` after every registry change for this container, so the
    /// host can schedule a render and [`reconcile`](Self::reconcile).
    pub fn watch(&self, callback: impl Fn(&ModalStack) + 'static) -> Subscription {
        self.inner.stack.subscribe(callback)
    }

    /// Bring mounted instances in line with the registry: mount new modals,
    /// refresh positions and attributes of kept ones, unmount removed ones.
    pub fn reconcile(&self) {
        let list = self.inner.modals.get();
        let previous = self.instances();
        let mut next = Vec::with_capacity(list.len());
        let mut fresh = Vec::new();

        for descriptor in &list {
            let kept = previous
                .iter()
                .find(|instance| Rc::ptr_eq(instance.descriptor(), descriptor));
            match kept {
                Some(instance) => next.push(instance.clone()),
                None => {
                    let instance =
                        ModalInstance::new(Rc::clone(descriptor), &Attrs::new(), self.env());
                    next.push(instance.clone());
                    fresh.push(instance);
                }
            }
        }
        let stale: Vec<ModalInstance> = previous
            .into_iter()
            .filter(|old| !next.iter().any(|instance| instance.ptr_eq(old)))
            .collect();

        for (instance, position) in next.iter().zip(layout(&next)) {
            instance.update_attrs(&self.attrs_for(instance.descriptor(), position));
        }
        *self.inner.instances.borrow_mut() = next;

        for instance in stale {
            instance.unmount();
        }
        for instance in fresh {
            instance.mount();
        }
    }

    fn env(&self) -> InstanceEnv {
        InstanceEnv {
            registry: self.inner.registry.clone(),
            platform: self.inner.platform.clone(),
            overlay: Rc::clone(&self.inner.overlay),
        }
    }

    fn attrs_for(&self, descriptor: &ModalDescriptor, position: StackPosition) -> Attrs {
        let config = self.inner.config.borrow();
        let context = ModalContext {
            index: position.index,
            count: position.count,
            emitter: self.inner.emitter.clone(),
            animations: Some(config.animations.clone()),
            options: Some(config.to_patch()),
        };
        inject(&context, &descriptor.props)
    }

    fn apply_options(&self) {
        let patch = self.inner.source.get();
        self.inner
            .registry
            .set_options(&self.inner.name, patch.clone());
        let merged = self.inner.defaults.resolve(&patch.unwrap_or_default());
        *self.inner.config.borrow_mut() = merged;
        self.sync_body_class();
    }

    fn sync_body_class(&self) {
        let count = self.inner.stack.with(ModalStack::depth);
        let wanted = if count > 0 {
            self.inner
                .config
                .borrow()
                .body_class
                .clone()
                .filter(|class| !class.is_empty())
        } else {
            None
        };
        let mut applied = self.inner.applied_class.borrow_mut();
        if *applied == wanted {
            return;
        }
        let document = &self.inner.platform.document;
        if let Some(old) = applied.take() {
            document.remove_body_class(&old);
        }
        if let Some(class) = &wanted {
            document.add_body_class(class);
        }
        debug!(container = %self.inner.name, count, class = ?wanted, "body class sync");
        *applied = wanted;
    }

    fn on_event(&self, event: &ModalEvent) {
        match event {
            ModalEvent::Added(key) => self.relayer(Some(key)),
            ModalEvent::BeforeRemove(_) => self.relayer(None),
            ModalEvent::Layer { .. } => {}
        }
    }

    /// Recompute sibling layers and signal each sibling, except `quiet`,
    /// whose layer changed.
    fn relayer(&self, quiet: Option<&ModalKey>) {
        let Some(emitter) = &self.inner.emitter else {
            return;
        };
        let instances = self.instances();
        for (instance, position) in instances.iter().zip(layout(&instances)) {
            if instance.is_closing() {
                continue;
            }
            instance.set_position(position);
            if Some(instance.key()) == quiet || instance.target_layer() == position.layer() {
                continue;
            }
            emitter.emit(&ModalEvent::Layer {
                target: SignalTarget::Identifier(instance.identifier().clone()),
                layer: position.layer(),
            });
        }
    }
}

/// Positions for `instances`; closing ones keep theirs and are skipped when
/// numbering the rest.
fn layout(instances: &[ModalInstance]) -> Vec<StackPosition> {
    let count = instances.iter().filter(|i| !i.is_closing()).count();
    let mut index = 0;
    instances
        .iter()
        .map(|instance| {
            if instance.is_closing() {
                instance.position()
            } else {
                let position = StackPosition::new(index, count);
                index += 1;
                position
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::TransitionName;
    use crate::descriptor::CloseMode;
    use crate::factory::CreateOptions;
    use crate::position::Layer;
    use crate::simple::SimpleContent;
    use crate::testing::TestPlatform;

    fn open(service: &ModalService, container: &str, title: &str) -> ModalId {
        service.create(
            SimpleContent::new(title),
            Attrs::new(),
            CreateOptions::new().container(container),
        )
    }

    fn setup(config: ContainerConfig) -> (TestPlatform, ModalService, ModalContainer) {
        let test = TestPlatform::new();
        let service = ModalService::default();
        let container = ModalContainer::new(&service, test.platform.clone(), config);
        (test, service, container)
    }

    fn bind_elements(test: &TestPlatform, service: &ModalService, ids: &[&ModalId]) {
        for id in ids {
            let descriptor = service
                .registry()
                .modal(DEFAULT_CONTAINER, id)
                .expect("registered");
            test.document
                .bind_modal(descriptor.key(), test.document.create_element(None));
        }
    }

    #[test]
    fn derived_view() {
        let (_test, service, container) = setup(ContainerConfig::default());
        assert!(container.is_empty());
        assert_eq!(container.active_id(), None);

        let a = open(&service, "main", "A");
        let b = open(&service, "main", "B");
        open(&service, "other", "X");
        assert_eq!(container.count(), 2);
        assert_eq!(
            container.active_id(),
            Some(ModalKey::for_modal("main", &b))
        );

        service.registry().remove_modal("main", &b);
        assert_eq!(
            container.active_id(),
            Some(ModalKey::for_modal("main", &a))
        );
    }

    #[test]
    fn four_modals_layers() {
        let (_test, service, container) = setup(ContainerConfig::default());
        let ids: Vec<ModalId> = ["A", "B", "C", "D"]
            .into_iter()
            .map(|t| open(&service, "main", t))
            .collect();
        container.reconcile();

        assert_eq!(container.count(), 4);
        assert_eq!(
            container.active_id(),
            Some(ModalKey::for_modal("main", &ids[3]))
        );
        let layers: Vec<Layer> = container.instances().iter().map(ModalInstance::layer).collect();
        assert_eq!(
            layers,
            vec![Layer::Hidden, Layer::Tertiary, Layer::Secondary, Layer::Active]
        );
        let classes: Vec<&str> = (0..4).map(|i| container.layer_class(i)).collect();
        assert_eq!(
            classes,
            vec!["modal-hidden", "modal-tertiary", "modal-secondary", "modal-active"]
        );
    }

    #[test]
    fn body_class_follows_count() {
        let (test, service, container) = setup(ContainerConfig::default());
        assert!(!test.document.has_body_class("modal-open"));

        let a = open(&service, "main", "A");
        let b = open(&service, "main", "B");
        assert!(test.document.has_body_class("modal-open"));

        service.registry().remove_modal("main", &a);
        assert!(test.document.has_body_class("modal-open"));
        service.registry().remove_modal("main", &b);
        assert!(!test.document.has_body_class("modal-open"));
        assert_eq!(test.document.class_log(), vec!["+modal-open", "-modal-open"]);
        drop(container);
    }

    #[test]
    fn body_class_change_swaps_classes() {
        let (test, service, container) = setup(ContainerConfig::default());
        open(&service, "main", "A");
        container.set_options(Some(OptionsPatch::new().body_class("locked")));
        assert_eq!(test.document.body_classes(), vec!["locked".to_string()]);
        assert_eq!(
            test.document.class_log(),
            vec!["+modal-open", "-modal-open", "+locked"]
        );

        container.set_options(Some(OptionsPatch::new().body_class("")));
        assert!(test.document.body_classes().is_empty());
    }

    #[test]
    fn drop_removes_applied_class_and_unmounts() {
        let (test, service, container) = setup(ContainerConfig::default());
        open(&service, "main", "A");
        container.reconcile();
        assert_eq!(test.document.listener_count(), 1);

        drop(container);
        assert!(test.document.body_classes().is_empty());
        assert_eq!(test.document.listener_count(), 0);
    }

    #[test]
    fn options_written_to_registry_and_config() {
        let source = Observable::new(Some(OptionsPatch::new().closable(false)));
        let (_test, service, container) =
            setup(ContainerConfig::new("main").options_source(source.clone()));
        assert_eq!(service.registry().options("main").closable, Some(false));
        assert!(!container.config().closable);

        source.set(None);
        assert!(service.registry().options("main").is_empty());
        assert!(container.config().closable);
    }

    #[test]
    fn defaults_change_remerges_config() {
        let (_test, service, container) = setup(ContainerConfig::default());
        service.set_default_options(&OptionsPatch::new().mobile_query("(max-width: 1px)"));
        assert_eq!(container.config().mobile_query, "(max-width: 1px)");
    }

    #[test]
    fn raw_variant_has_no_channel() {
        let (test, service, container) = setup(ContainerConfig::new("main").raw());
        assert!(container.emitter().is_none());
        open(&service, "main", "A");
        container.reconcile();
        test.settle();
        let instance = container.active_instance().unwrap();
        assert!(instance.emitter().is_none());
        assert!(instance.is_mounted());
    }

    #[test]
    fn reconcile_mounts_and_unmounts() {
        let (test, service, container) = setup(ContainerConfig::default());
        let a = open(&service, "main", "A");
        assert!(container.needs_reconcile());
        container.reconcile();
        assert!(!container.needs_reconcile());
        let first = container.instance(&a).unwrap();
        assert!(first.is_mounted());

        open(&service, "main", "B");
        container.reconcile();
        assert!(container.instance(&a).unwrap().ptr_eq(&first), "kept instance reused");
        assert_eq!(test.document.listener_count(), 2);

        service.registry().remove_modal("main", &a);
        container.reconcile();
        assert!(!first.is_mounted());
        assert_eq!(container.instances().len(), 1);
        assert_eq!(test.document.listener_count(), 1);
    }

    #[test]
    fn added_modal_pushes_siblings_down() {
        let (test, service, container) = setup(ContainerConfig::default());
        let a = open(&service, "main", "A");
        bind_elements(&test, &service, &[&a]);
        container.reconcile();
        test.settle();
        test.animator.clear();

        let b = open(&service, "main", "B");
        bind_elements(&test, &service, &[&b]);
        container.reconcile();
        test.settle();

        let mut transitions = test.animator.transitions();
        transitions.sort_by_key(|t| t.map(TransitionName::as_str));
        assert_eq!(
            transitions,
            vec![Some(TransitionName::Enter), Some(TransitionName::Secondary)]
        );
        assert_eq!(container.instance(&a).unwrap().displayed_layer(), Layer::Secondary);
    }

    #[test]
    fn closing_top_activates_next() {
        let (test, service, container) = setup(ContainerConfig::default());
        let a = open(&service, "main", "A");
        let b = open(&service, "main", "B");
        bind_elements(&test, &service, &[&a, &b]);
        container.reconcile();
        test.settle();
        test.animator.clear();

        let top = container.instance(&b).unwrap();
        test.spawn(async move { top.close(CloseMode::Manual).await });
        test.settle();

        assert_eq!(container.instance(&a).unwrap().layer(), Layer::Active);
        let transitions = test.animator.transitions();
        assert!(transitions.contains(&Some(TransitionName::Activate)));
        assert!(transitions.contains(&Some(TransitionName::Leave)));
        assert_eq!(container.count(), 1);

        container.reconcile();
        assert_eq!(container.instances().len(), 1);
    }

    fn open_each(
        test: &TestPlatform,
        service: &ModalService,
        container: &ModalContainer,
        titles: &[&str],
    ) -> Vec<ModalId> {
        titles
            .iter()
            .map(|title| {
                let id = open(service, "main", title);
                bind_elements(test, service, &[&id]);
                container.reconcile();
                test.settle();
                id
            })
            .collect()
    }

    #[test]
    fn raw_buried_modal_closes_without_leave() {
        let (test, service, container) = setup(ContainerConfig::new("main").raw());
        let ids = open_each(&test, &service, &container, &["A", "B", "C", "D", "E"]);
        let bottom = container.instance(&ids[0]).unwrap();
        assert_eq!(bottom.layer(), Layer::Hidden);
        assert_eq!(bottom.displayed_layer(), Layer::Hidden);
        test.animator.clear();

        assert_eq!(
            futures::executor::block_on(bottom.refuse()),
            Some(crate::animation::TransitionStatus::Ignored)
        );
        test.spawn(async move { bottom.close(CloseMode::Manual).await });
        test.settle();
        assert!(test.animator.transitions().is_empty());
        assert_eq!(container.count(), 4);
    }

    #[test]
    fn raw_layers_follow_position() {
        let (test, service, container) = setup(ContainerConfig::new("main").raw());
        let ids = open_each(&test, &service, &container, &["A", "B"]);
        let a = container.instance(&ids[0]).unwrap();
        assert_eq!(a.displayed_layer(), Layer::Secondary);

        service.registry().remove_modal("main", &ids[1]);
        container.reconcile();
        assert_eq!(a.displayed_layer(), Layer::Active);
    }

    #[test]
    fn removing_hidden_modal_leaves_siblings_still() {
        let (test, service, container) = setup(ContainerConfig::default());
        let ids = open_each(&test, &service, &container, &["A", "B", "C", "D", "E"]);
        test.animator.clear();

        let bottom = container.instance(&ids[0]).unwrap();
        test.spawn(async move { bottom.close(CloseMode::Manual).await });
        test.settle();
        container.reconcile();

        assert!(test.animator.transitions().is_empty());
        let layers: Vec<Layer> = container
            .instances()
            .iter()
            .map(ModalInstance::displayed_layer)
            .collect();
        assert_eq!(
            layers,
            vec![Layer::Hidden, Layer::Tertiary, Layer::Secondary, Layer::Active]
        );
    }

    #[test]
    fn batch_reconcile_signals_each_sibling_once() {
        let (test, service, container) = setup(ContainerConfig::default());
        let ids = open_each(&test, &service, &container, &["A"]);
        test.animator.clear();

        let b = open(&service, "main", "B");
        let c = open(&service, "main", "C");
        bind_elements(&test, &service, &[&b, &c]);
        container.reconcile();
        test.settle();

        let mut transitions = test.animator.transitions();
        transitions.sort_by_key(|t| t.map(TransitionName::as_str));
        assert_eq!(
            transitions,
            vec![
                Some(TransitionName::Enter),
                Some(TransitionName::Enter),
                Some(TransitionName::Tertiary),
            ]
        );
        assert_eq!(
            container.instance(&ids[0]).unwrap().displayed_layer(),
            Layer::Tertiary
        );
    }

    #[test]
    fn overlay_resolved_from_document() {
        let test = TestPlatform::new();
        let overlay = test.document.create_element(None);
        test.document.bind_overlay("main", overlay);
        let service = ModalService::default();
        let container =
            ModalContainer::new(&service, test.platform.clone(), ContainerConfig::default());
        assert_eq!(container.overlay(), Some(overlay));
        container.set_overlay(None);
        assert_eq!(container.overlay(), None);
    }
}
