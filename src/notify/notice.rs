//! Single-slot notice for settings forms

use super::store::NotificationKind;
use serde::{Deserialize, Serialize};

/// One banner owned by a form or page.
///
/// There is no expiry: the owner decides when to hide it. Hiding keeps the
/// last kind and message so a closing animation can still read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsNotice {
    kind: NotificationKind,
    message: String,
    visible: bool,
}

impl SettingsNotice {
    pub fn new() -> Self {
        Self {
            kind: NotificationKind::Info,
            message: String::new(),
            visible: false,
        }
    }

    /// Replace the slot contents and make it visible
    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.kind = kind;
        self.message = message.into();
        self.visible = true;
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(NotificationKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message);
    }

    /// Hide without clearing contents
    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Default for SettingsNotice {
    fn default() -> Self {
        Self::new()
    }
}
