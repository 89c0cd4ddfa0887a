#![forbid(unsafe_code)]

//! Modal creation: identifiers, effective options, descriptor insertion.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::bridge::{AttrValue, Attrs};
use crate::descriptor::{
    ActionHandler, ClickArea, ClickHandler, CloseHandler, CloseMode, HandlerFuture, ModalContent,
    ModalDescriptor, ModalId, ModalKey, ModalParams, OpenHandler,
};
use crate::error::HandlerError;
use crate::options::DefaultOptions;
use crate::registry::ModalRegistry;
use crate::simple::SimpleContent;

/// Container used when none is named.
pub const DEFAULT_CONTAINER: &str = "main";

/// Per-modal creation options.
#[derive(Clone, Default)]
pub struct CreateOptions {
    pub container: Option<String>,
    /// Overrides the container/default `closable`.
    pub closable: Option<bool>,
    pub on_open: Option<OpenHandler>,
    pub on_close: Option<CloseHandler>,
    pub on_click: Option<ClickHandler>,
    pub on_action: Option<ActionHandler>,
}

impl fmt::Debug for CreateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateOptions")
            .field("container", &self.container)
            .field("closable", &self.closable)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("on_action", &self.on_action.is_some())
            .finish()
    }
}

impl CreateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    #[must_use]
    pub fn closable(mut self, closable: bool) -> Self {
        self.closable = Some(closable);
        self
    }

    /// Called once the enter transition has settled.
    #[must_use]
    pub fn on_open(mut self, f: impl Fn() + 'static) -> Self {
        self.on_open = Some(Rc::new(f));
        self
    }

    /// Called after the leave transition, before the modal is unregistered.
    #[must_use]
    pub fn on_close(mut self, f: impl Fn(CloseMode) + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }

    /// Decide whether a click closes the modal.
    #[must_use]
    pub fn on_click<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ClickArea) -> Fut + 'static,
        Fut: Future<Output = Result<bool, HandlerError>> + 'static,
    {
        self.on_click = Some(Rc::new(move |area: ClickArea| -> HandlerFuture {
            Box::pin(f(area))
        }));
        self
    }

    /// Handle a named action; resolving `true` closes the modal.
    #[must_use]
    pub fn on_action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<Value>) -> Fut + 'static,
        Fut: Future<Output = Result<bool, HandlerError>> + 'static,
    {
        self.on_action = Some(Rc::new(
            move |key: &str, data: Option<Value>| -> HandlerFuture { Box::pin(f(key, data)) },
        ));
        self
    }
}

/// Options for [`ModalFactory::simple`].
#[derive(Debug, Clone, Default)]
pub struct SimpleOptions {
    pub title: Option<String>,
    pub primary_action: Option<String>,
    pub secondary_action: Option<String>,
    /// Extra props forwarded to the content.
    pub props: Attrs,
    pub create: CreateOptions,
}

impl SimpleOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn primary_action(mut self, label: impl Into<String>) -> Self {
        self.primary_action = Some(label.into());
        self
    }

    #[must_use]
    pub fn secondary_action(mut self, label: impl Into<String>) -> Self {
        self.secondary_action = Some(label.into());
        self
    }

    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn create(mut self, create: CreateOptions) -> Self {
        self.create = create;
        self
    }
}

/// Creates modals and registers them.
#[derive(Debug, Clone)]
pub struct ModalFactory {
    registry: ModalRegistry,
    defaults: DefaultOptions,
}

impl ModalFactory {
    #[must_use]
    pub fn new(registry: ModalRegistry, defaults: DefaultOptions) -> Self {
        Self { registry, defaults }
    }

    /// Register a modal showing `content`. Returns its identifier.
    pub fn create(
        &self,
        content: impl ModalContent,
        props: Attrs,
        options: CreateOptions,
    ) -> ModalId {
        self.create_shared(Rc::new(content), props, options)
    }

    /// [`create`](Self::create) for content that is already shared.
    pub fn create_shared(
        &self,
        content: Rc<dyn ModalContent>,
        props: Attrs,
        options: CreateOptions,
    ) -> ModalId {
        let CreateOptions {
            container,
            closable,
            on_open,
            on_close,
            on_click,
            on_action,
        } = options;
        let container = container.unwrap_or_else(|| DEFAULT_CONTAINER.to_string());
        let identifier = ModalId::generate();
        let key = ModalKey::for_modal(&container, &identifier);
        let closable = closable.unwrap_or_else(|| {
            self.defaults
                .resolve(&self.registry.options(&container))
                .closable
        });
        debug!(container = %container, key = %key, closable, kind = content.kind(), "modal create");

        let params = Rc::new(ModalParams {
            key,
            identifier: identifier.clone(),
            container: container.clone(),
            closable,
            on_open,
            on_close,
            on_click,
            on_action,
        });
        self.registry.add_modal(
            &container,
            ModalDescriptor {
                params,
                content,
                props,
            },
        );
        identifier
    }

    /// Register a [`SimpleContent`] modal.
    pub fn simple(&self, message: impl Into<String>, options: SimpleOptions) -> ModalId {
        let SimpleOptions {
            title,
            primary_action,
            secondary_action,
            props,
            create,
        } = options;
        let content = SimpleContent {
            title,
            message: message.into(),
            primary_action,
            secondary_action,
        };
        self.create(content, props, create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionsPatch;
    use std::cell::Cell;

    fn factory() -> (ModalRegistry, DefaultOptions, ModalFactory) {
        let registry = ModalRegistry::new();
        let defaults = DefaultOptions::default();
        let factory = ModalFactory::new(registry.clone(), defaults.clone());
        (registry, defaults, factory)
    }

    #[test]
    fn create_uses_main_container() {
        let (registry, _, factory) = factory();
        let id = factory.create(SimpleContent::new("hi"), Attrs::new(), CreateOptions::new());
        let descriptor = registry.modal(DEFAULT_CONTAINER, &id).unwrap();
        assert_eq!(descriptor.params.container, "main");
        assert_eq!(descriptor.key().as_str(), format!("main-{id}"));
        assert!(descriptor.params.closable);
    }

    #[test]
    fn closable_resolution_order() {
        let (registry, defaults, factory) = factory();
        defaults.set(&OptionsPatch::new().closable(false));
        let a = factory.create(SimpleContent::new("a"), Attrs::new(), CreateOptions::new());
        assert!(!registry.modal("main", &a).unwrap().params.closable);

        registry.set_options("side", Some(OptionsPatch::new().closable(true)));
        let b = factory.create(
            SimpleContent::new("b"),
            Attrs::new(),
            CreateOptions::new().container("side"),
        );
        assert!(registry.modal("side", &b).unwrap().params.closable);

        let c = factory.create(
            SimpleContent::new("c"),
            Attrs::new(),
            CreateOptions::new().container("side").closable(false),
        );
        assert!(!registry.modal("side", &c).unwrap().params.closable);
    }

    #[test]
    fn closable_is_snapshotted() {
        let (registry, defaults, factory) = factory();
        let id = factory.create(SimpleContent::new("a"), Attrs::new(), CreateOptions::new());
        defaults.set(&OptionsPatch::new().closable(false));
        assert!(registry.modal("main", &id).unwrap().params.closable);
    }

    #[test]
    fn handlers_are_wrapped() {
        let (registry, _, factory) = factory();
        let opened = Rc::new(Cell::new(false));
        let o = Rc::clone(&opened);
        let id = factory.create(
            SimpleContent::new("a"),
            Attrs::new(),
            CreateOptions::new()
                .on_open(move || o.set(true))
                .on_click(|area| async move { Ok(area == ClickArea::Overlay) })
                .on_action(|key, _data| {
                    let approve = key == "primary";
                    async move { Ok(approve) }
                }),
        );
        let params = Rc::clone(&registry.modal("main", &id).unwrap().params);

        (params.on_open.as_ref().unwrap())();
        assert!(opened.get());
        let click = params.on_click.as_ref().unwrap();
        assert!(futures::executor::block_on(click(ClickArea::Overlay)).unwrap());
        assert!(!futures::executor::block_on(click(ClickArea::Modal)).unwrap());
        let action = params.on_action.as_ref().unwrap();
        assert!(futures::executor::block_on(action("primary", None)).unwrap());
    }

    #[test]
    fn simple_builds_content() {
        let (registry, _, factory) = factory();
        let id = factory.simple(
            "Are you sure?",
            SimpleOptions::new()
                .title("Confirm")
                .primary_action("Yes")
                .secondary_action("No")
                .prop("tone", "danger")
                .create(CreateOptions::new().container("dialogs")),
        );
        let descriptor = registry.modal("dialogs", &id).unwrap();
        let content = descriptor
            .content
            .downcast_ref::<SimpleContent>()
            .unwrap();
        assert_eq!(content.message, "Are you sure?");
        assert_eq!(content.title.as_deref(), Some("Confirm"));
        assert_eq!(content.buttons().len(), 2);
        assert!(descriptor.props.contains_key("tone"));
    }

    #[test]
    fn identifiers_are_unique() {
        let (registry, _, factory) = factory();
        let a = factory.create(SimpleContent::new("a"), Attrs::new(), CreateOptions::new());
        let b = factory.create(SimpleContent::new("a"), Attrs::new(), CreateOptions::new());
        assert_ne!(a, b);
        assert_eq!(registry.count("main"), 2);
    }
}
