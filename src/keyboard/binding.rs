//! Key combinations, key events and shortcut bindings

use crate::error::{DjobeaError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Modifier keys. Anything not set is required to be released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        meta: false,
        ctrl: false,
        shift: false,
        alt: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Normalize a key name: lowercase plus a few aliases
fn normalize_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        "spacebar" | "space" => " ".to_string(),
        "del" => "delete".to_string(),
        _ => lower,
    }
}

/// A key plus the exact set of modifiers that must be held
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    key: String,
    modifiers: Modifiers,
}

impl KeyCombo {
    /// Combo with no modifiers
    pub fn new(key: &str) -> Self {
        Self {
            key: normalize_key(key),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// Normalized key name
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Exact match on modifiers, case-insensitive match on the key
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.modifiers == event.modifiers && self.key == normalize_key(&event.key)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [(m.meta, "meta"), (m.ctrl, "ctrl"), (m.alt, "alt"), (m.shift, "shift")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        match self.key.as_str() {
            " " => f.write_str("space"),
            key => f.write_str(key),
        }
    }
}

impl FromStr for KeyCombo {
    type Err = DjobeaError;

    /// Parse `"ctrl+shift+p"`, `"meta+k"`, `"?"`, `"escape"`, `"ctrl++"`.
    fn from_str(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DjobeaError::invalid_shortcut(text, "empty"));
        }

        let (prefix, key) = if trimmed == "+" {
            ("", "+")
        } else if let Some(rest) = trimmed.strip_suffix("++") {
            (rest, "+")
        } else {
            trimmed.rsplit_once('+').unwrap_or(("", trimmed))
        };

        if key.trim().is_empty() {
            return Err(DjobeaError::invalid_shortcut(text, "missing key"));
        }

        let mut combo = KeyCombo::new(key.trim());
        for token in prefix.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            match token.to_lowercase().as_str() {
                "meta" | "cmd" | "command" | "super" | "mod" => combo.modifiers.meta = true,
                "ctrl" | "control" => combo.modifiers.ctrl = true,
                "shift" => combo.modifiers.shift = true,
                "alt" | "option" | "opt" => combo.modifiers.alt = true,
                other => {
                    return Err(DjobeaError::invalid_shortcut(
                        text,
                        format!("unknown modifier '{}'", other),
                    ))
                }
            }
        }

        Ok(combo)
    }
}

impl Serialize for KeyCombo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyCombo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether a key went down or came up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPhase {
    #[default]
    Down,
    Up,
}

/// A key event delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
    pub phase: KeyPhase,
}

impl KeyEvent {
    /// Key-down event with no modifiers held
    pub fn down(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
            phase: KeyPhase::Down,
        }
    }

    /// Key-up event with no modifiers held
    pub fn up(key: impl Into<String>) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..Self::down(key)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    /// The key-down event a combo describes
    pub fn from_combo(combo: &KeyCombo) -> Self {
        Self::down(combo.key()).with_modifiers(combo.modifiers())
    }
}

/// Zero-argument shortcut callback
pub type ShortcutAction = Arc<dyn Fn() + Send + Sync>;

/// A key combo bound to an action
#[derive(Clone)]
pub struct ShortcutBinding {
    pub combo: KeyCombo,
    pub description: String,
    pub action: ShortcutAction,
}

impl ShortcutBinding {
    pub fn new(
        combo: KeyCombo,
        description: impl Into<String>,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            combo,
            description: description.into(),
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for ShortcutBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutBinding")
            .field("combo", &self.combo.to_string())
            .field("description", &self.description)
            .finish()
    }
}
