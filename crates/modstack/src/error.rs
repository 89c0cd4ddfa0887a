#![forbid(unsafe_code)]

//! Error types surfaced by the modal service and option parsing.
//!
//! Runtime failures inside a modal's lifecycle (animation rejections, handler
//! errors) are never returned to callers; they are logged and folded into the
//! lifecycle state instead. Only configuration mistakes reach this enum.

/// Errors returned by service installation and option parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// The modal service was used before [`ModalService::install`](crate::ModalService::install).
    NotInstalled,
    /// A service is already installed on this thread.
    AlreadyInstalled,
    /// An option document could not be parsed.
    InvalidOptions(String),
}

impl std::fmt::Display for ModalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInstalled => write!(
                f,
                "modal service is not installed; call ModalService::install first"
            ),
            Self::AlreadyInstalled => write!(f, "modal service is already installed"),
            Self::InvalidOptions(reason) => write!(f, "invalid modal options: {reason}"),
        }
    }
}

impl std::error::Error for ModalError {}

/// Error type returned by host click and action handlers.
pub type HandlerError = Box<dyn std::error::Error>;
