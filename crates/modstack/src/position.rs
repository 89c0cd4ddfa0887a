#![forbid(unsafe_code)]

//! Stack positions and the visual layer they map to.
//!
//! Layers depend only on the distance from the top of the stack: the last
//! modal is active, the two below it are secondary and tertiary, everything
//! deeper is hidden.

use crate::animation::TransitionName;

/// Visual layer of a modal inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Active,
    Secondary,
    Tertiary,
    Hidden,
}

impl Layer {
    /// CSS class used by the raw container variant.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Active => "modal-active",
            Self::Secondary => "modal-secondary",
            Self::Tertiary => "modal-tertiary",
            Self::Hidden => "modal-hidden",
        }
    }

    /// Event channel topic that moves a modal into this layer.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::Active => "activate",
            Self::Secondary => "goSecondary",
            Self::Tertiary => "goTertiary",
            Self::Hidden => "hide",
        }
    }

    #[must_use]
    pub const fn transition(self) -> TransitionName {
        match self {
            Self::Active => TransitionName::Activate,
            Self::Secondary => TransitionName::Secondary,
            Self::Tertiary => TransitionName::Tertiary,
            Self::Hidden => TransitionName::Hide,
        }
    }
}

/// `(index, count)` of a modal within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StackPosition {
    pub index: usize,
    pub count: usize,
}

impl StackPosition {
    #[must_use]
    pub const fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// Out-of-range positions count as the top of the stack.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self.count.saturating_sub(self.index) {
            0 | 1 => Layer::Active,
            2 => Layer::Secondary,
            3 => Layer::Tertiary,
            _ => Layer::Hidden,
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self.layer(), Layer::Active)
    }

    #[must_use]
    pub const fn is_secondary(self) -> bool {
        matches!(self.layer(), Layer::Secondary)
    }

    #[must_use]
    pub const fn is_tertiary(self) -> bool {
        matches!(self.layer(), Layer::Tertiary)
    }

    #[must_use]
    pub const fn is_hidden(self) -> bool {
        matches!(self.layer(), Layer::Hidden)
    }
}

/// Raw-variant class for the modal at `index` of `count`.
#[must_use]
pub fn layer_class(index: usize, count: usize) -> &'static str {
    StackPosition::new(index, count).layer().class_name()
}
