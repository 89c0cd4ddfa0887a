#![forbid(unsafe_code)]

//! Built-in content for message modals.
//!
//! [`SimpleContent`] carries an optional title, a message, and up to two
//! action buttons. The host renders it; pressing a button should call
//! [`ModalInstance::action`](crate::ModalInstance::action) with the button's
//! `id`.
//!
//! ```ignore
//! let alert = SimpleContent::alert("Saved", "File written.");
//! let confirm = SimpleContent::confirm("Delete file?", "This cannot be undone.");
//! ```

use std::any::Any;

use crate::descriptor::ModalContent;

/// Action id of the primary button.
pub const PRIMARY_ACTION: &str = "primary";
/// Action id of the secondary button.
pub const SECONDARY_ACTION: &str = "secondary";

/// A button in a simple modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleButton {
    pub label: String,
    /// Action key passed to the modal's action handler.
    pub id: String,
    pub primary: bool,
}

impl SimpleButton {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            primary: false,
        }
    }

    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// Title, message and optional primary/secondary buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleContent {
    pub title: Option<String>,
    pub message: String,
    pub primary_action: Option<String>,
    pub secondary_action: Option<String>,
}

impl SimpleContent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Message with a single OK button.
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(message).title(title).primary_action("OK")
    }

    /// Message with OK and Cancel buttons.
    pub fn confirm(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(message)
            .title(title)
            .primary_action("OK")
            .secondary_action("Cancel")
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

    /// Buttons in display order: secondary first, primary last.
    #[must_use]
    pub fn buttons(&self) -> Vec<SimpleButton> {
        let secondary = self
            .secondary_action
            .as_ref()
            .map(|label| SimpleButton::new(label.clone(), SECONDARY_ACTION));
        let primary = self
            .primary_action
            .as_ref()
            .map(|label| SimpleButton::new(label.clone(), PRIMARY_ACTION).primary());
        secondary.into_iter().chain(primary).collect()
    }
}

impl ModalContent for SimpleContent {
    fn kind(&self) -> &str {
        "simple"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
