#![forbid(unsafe_code)]

//! Modal descriptors: the immutable record the factory stores in the
//! registry for every open modal.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;
use uuid::Uuid;

use crate::bridge::Attrs;
use crate::error::HandlerError;

/// Globally unique identifier of one modal instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(Rc<str>);

impl ModalId {
    /// Fresh random identifier (UUID v4, simple form).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string().into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModalId {
    fn from(raw: &str) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ModalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stack-relative address of a modal: `"<container>-<identifier>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalKey(Rc<str>);

impl ModalKey {
    #[must_use]
    pub fn for_modal(container: &str, identifier: &ModalId) -> Self {
        Self(format!("{container}-{identifier}").into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModalKey {
    fn from(raw: &str) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for ModalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a modal was closed, reported to `on_close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseMode {
    /// Closed programmatically.
    Manual,
    /// A content click handler resolved `true`.
    Click,
    /// Closed from the dimmer.
    Overlay,
    /// An action handler resolved `true`.
    Action,
}

impl CloseMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Click => "click",
            Self::Overlay => "overlay",
            Self::Action => "action",
        }
    }
}

/// Where a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickArea {
    /// Inside the modal's own element.
    Modal,
    /// On the container dimmer.
    Overlay,
}

impl ClickArea {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::Overlay => "overlay",
        }
    }

    /// Close mode used when a click handler approves closing.
    #[must_use]
    pub const fn close_mode(self) -> CloseMode {
        match self {
            Self::Modal => CloseMode::Click,
            Self::Overlay => CloseMode::Overlay,
        }
    }
}

/// Future returned by click and action handlers; `Ok(true)` closes the modal.
pub type HandlerFuture = LocalBoxFuture<'static, Result<bool, HandlerError>>;

pub type OpenHandler = Rc<dyn Fn()>;
pub type CloseHandler = Rc<dyn Fn(CloseMode)>;
pub type ClickHandler = Rc<dyn Fn(ClickArea) -> HandlerFuture>;
pub type ActionHandler = Rc<dyn Fn(&str, Option<Value>) -> HandlerFuture>;

/// Immutable per-modal parameters.
pub struct ModalParams {
    pub key: ModalKey,
    pub identifier: ModalId,
    pub container: String,
    pub closable: bool,
    pub on_open: Option<OpenHandler>,
    pub on_close: Option<CloseHandler>,
    pub on_click: Option<ClickHandler>,
    pub on_action: Option<ActionHandler>,
}

impl fmt::Debug for ModalParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalParams")
            .field("key", &self.key)
            .field("container", &self.container)
            .field("closable", &self.closable)
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("on_action", &self.on_action.is_some())
            .finish()
    }
}

/// Content rendered inside a modal. The controller only carries it around;
/// the host renders it.
pub trait ModalContent: 'static {
    /// Short type tag the host can dispatch on.
    fn kind(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

impl dyn ModalContent {
    /// Downcast to the concrete content type.
    #[must_use]
    pub fn downcast_ref<C: ModalContent>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }
}

/// A registered modal: parameters, content and pass-through props.
#[derive(Clone)]
pub struct ModalDescriptor {
    pub params: Rc<ModalParams>,
    pub content: Rc<dyn ModalContent>,
    pub props: Attrs,
}

impl ModalDescriptor {
    #[must_use]
    pub fn identifier(&self) -> &ModalId {
        &self.params.identifier
    }

    #[must_use]
    pub fn key(&self) -> &ModalKey {
        &self.params.key
    }
}

impl fmt::Debug for ModalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalDescriptor")
            .field("params", &self.params)
            .field("content", &self.content.kind())
            .field("props", &self.props.len())
            .finish()
    }
}
