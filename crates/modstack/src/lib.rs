#![forbid(unsafe_code)]

//! Stacked modal dialog controller.
//!
//! `modstack` keeps track of the modals open in one or more named containers,
//! derives which one is active and how the rest are layered beneath it, and
//! drives their enter, leave and layer transitions through a host-provided
//! animator. Rendering stays with the host.
//!
//! # Architecture
//!
//! - [`ModalService`]: defaults, registry and factory for one UI thread.
//! - [`ModalRegistry`]: ordered modal descriptors per container.
//! - [`ModalFactory`]: creates descriptors with resolved options.
//! - [`ModalContainer`]: binds a container to the document, reconciles
//!   [`ModalInstance`] controllers with the registry.
//! - [`ModalInstance`]: one modal's lifecycle, clicks, handlers and
//!   transitions.
//! - [`Document`] / [`Animator`]: the host seams.
//!
//! Everything is single-threaded and cooperative: async work is spawned on
//! the host's [`LocalSpawn`](futures::task::LocalSpawn).
//!
//! # Example
//!
//! ```ignore
//! let service = ModalService::default();
//! let container = service.container(platform, ContainerConfig::default());
//! service.simple("Saved.", SimpleOptions::new().primary_action("OK"));
//! container.reconcile();
//! ```

pub mod animation;
pub mod bridge;
pub mod container;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod factory;
pub mod instance;
pub mod options;
pub mod platform;
pub mod position;
pub mod registry;
pub mod service;
pub mod simple;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use animation::{AnimationDef, AnimationMap, TransitionName, TransitionStatus};
pub use bridge::{AttrValue, Attrs, ModalContext};
pub use container::{ContainerConfig, ModalContainer};
pub use descriptor::{
    ClickArea, CloseMode, HandlerFuture, ModalContent, ModalDescriptor, ModalId, ModalKey,
    ModalParams,
};
pub use error::{HandlerError, ModalError};
pub use events::{ModalEmitter, ModalEvent, SignalTarget};
pub use factory::{CreateOptions, DEFAULT_CONTAINER, ModalFactory, SimpleOptions};
pub use instance::{InstanceEnv, ModalInstance, ModalPhase};
pub use options::{DefaultOptions, ModalOptions, OptionsPatch};
pub use platform::{Animator, AnimationError, Document, ElementId, ListenerId, Platform};
pub use position::{Layer, StackPosition};
pub use registry::{ModalList, ModalRegistry, ModalStack};
pub use service::{ModalService, create, simple};
pub use simple::SimpleContent;

pub use modstack_reactive as reactive;
