#![forbid(unsafe_code)]

//! The modal service: defaults, registry and factory bundled together.
//!
//! A service is an ordinary value and can be passed around explicitly. For
//! hosts that need ambient access, [`ModalService::install`] makes it the
//! current service of the calling thread; [`ModalService::current`] and the
//! free functions [`create`] / [`simple`] then reach it.
//!
//! # Failure Modes
//!
//! - [`ModalService::current`], [`create`] and [`simple`] panic when no
//!   service is installed; use [`ModalService::try_current`] to handle that
//!   case.
//! - Installing twice on one thread returns [`ModalError::AlreadyInstalled`].

use std::cell::RefCell;

use tracing::debug;

use crate::bridge::Attrs;
use crate::container::{ContainerConfig, ModalContainer};
use crate::descriptor::{ModalContent, ModalId};
use crate::error::ModalError;
use crate::factory::{CreateOptions, ModalFactory, SimpleOptions};
use crate::options::{DefaultOptions, ModalOptions, OptionsPatch};
use crate::platform::Platform;
use crate::registry::ModalRegistry;

thread_local! {
    static INSTALLED: RefCell<Option<ModalService>> = const { RefCell::new(None) };
}

/// Shared modal state for one UI thread. Clones share state.
#[derive(Debug, Clone)]
pub struct ModalService {
    defaults: DefaultOptions,
    registry: ModalRegistry,
    factory: ModalFactory,
}

impl Default for ModalService {
    fn default() -> Self {
        Self::new(ModalOptions::default())
    }
}

impl ModalService {
    #[must_use]
    pub fn new(defaults: ModalOptions) -> Self {
        let defaults = DefaultOptions::new(defaults);
        let registry = ModalRegistry::new();
        let factory = ModalFactory::new(registry.clone(), defaults.clone());
        Self {
            defaults,
            registry,
            factory,
        }
    }

    /// Make this the current service of the calling thread.
    pub fn install(&self) -> Result<(), ModalError> {
        INSTALLED.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(ModalError::AlreadyInstalled);
            }
            *slot = Some(self.clone());
            debug!("modal service installed");
            Ok(())
        })
    }

    /// Remove the current service of the calling thread, if any.
    pub fn uninstall() -> Option<Self> {
        INSTALLED.with(|slot| slot.borrow_mut().take())
    }

    /// The current service of the calling thread.
    pub fn try_current() -> Result<Self, ModalError> {
        INSTALLED.with(|slot| slot.borrow().clone().ok_or(ModalError::NotInstalled))
    }

    /// The current service of the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if no service is installed.
    #[must_use]
    pub fn current() -> Self {
        match Self::try_current() {
            Ok(service) => service,
            Err(err) => panic!("{err}"),
        }
    }

    #[must_use]
    pub fn defaults(&self) -> &DefaultOptions {
        &self.defaults
    }

    #[must_use]
    pub fn registry(&self) -> &ModalRegistry {
        &self.registry
    }

    #[must_use]
    pub fn factory(&self) -> &ModalFactory {
        &self.factory
    }

    /// Deep-merge `patch` into the defaults.
    pub fn set_default_options(&self, patch: &OptionsPatch) {
        self.defaults.set(patch);
    }

    /// Snapshot of the defaults.
    #[must_use]
    pub fn default_options(&self) -> ModalOptions {
        self.defaults.get()
    }

    pub fn create(
        &self,
        content: impl ModalContent,
        props: Attrs,
        options: CreateOptions,
    ) -> ModalId {
        self.factory.create(content, props, options)
    }

    pub fn simple(&self, message: impl Into<String>, options: SimpleOptions) -> ModalId {
        self.factory.simple(message, options)
    }

    /// Bind a container controller to this service.
    #[must_use]
    pub fn container(&self, platform: Platform, config: ContainerConfig) -> ModalContainer {
        ModalContainer::new(self, platform, config)
    }
}

/// Create a modal on the current service.
///
/// # Panics
///
/// Panics if no service is installed.
pub fn create(content: impl ModalContent, props: Attrs, options: CreateOptions) -> ModalId {
    ModalService::current().create(content, props, options)
}

/// Create a simple message modal on the current service.
///
/// # Panics
///
/// Panics if no service is installed.
pub fn simple(message: impl Into<String>, options: SimpleOptions) -> ModalId {
    ModalService::current().simple(message, options)
}
