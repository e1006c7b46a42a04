//! Built-in shortcut commands and the default key map

use super::binding::KeyCombo;
use super::registry::ShortcutRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a configured shortcut can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutCommand {
    OpenSearch,
    OpenCommandPalette,
    ToggleHelp,
    CloseOverlays,
}

impl ShortcutCommand {
    /// Human description shown in the help overlay
    pub fn description(&self) -> &'static str {
        match self {
            Self::OpenSearch => "Open search",
            Self::OpenCommandPalette => "Open command palette",
            Self::ToggleHelp => "Show keyboard shortcuts",
            Self::CloseOverlays => "Close overlays",
        }
    }

    /// Run the command against `registry`
    pub fn run(&self, registry: &ShortcutRegistry) {
        match self {
            Self::OpenSearch => registry.open_search(),
            Self::OpenCommandPalette => registry.open_command_palette(),
            Self::ToggleHelp => registry.toggle_help(),
            Self::CloseOverlays => registry.close_all_overlays(),
        }
    }

    /// Bind this command to `combo` in `registry`
    pub fn bind(self, registry: &ShortcutRegistry, combo: KeyCombo) {
        let target = registry.clone();
        registry.register_binding(super::ShortcutBinding::new(
            combo,
            self.description(),
            move || self.run(&target),
        ));
    }
}

impl fmt::Display for ShortcutCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The dashboard's stock key map.
///
/// Both meta and ctrl variants are bound so the same muscle memory works on
/// macOS and elsewhere.
pub fn default_keymap() -> Vec<(KeyCombo, ShortcutCommand)> {
    vec![
        (KeyCombo::new("k").meta(), ShortcutCommand::OpenSearch),
        (KeyCombo::new("k").ctrl(), ShortcutCommand::OpenSearch),
        (KeyCombo::new("p").meta().shift(), ShortcutCommand::OpenCommandPalette),
        (KeyCombo::new("p").ctrl().shift(), ShortcutCommand::OpenCommandPalette),
        (KeyCombo::new("?"), ShortcutCommand::ToggleHelp),
        (KeyCombo::new("?").shift(), ShortcutCommand::ToggleHelp),
        (KeyCombo::new("escape"), ShortcutCommand::CloseOverlays),
    ]
}

/// Register the stock key map
pub fn register_default_shortcuts(registry: &ShortcutRegistry) {
    for (combo, command) in default_keymap() {
        command.bind(registry, combo);
    }
}
