//! Shortcut registry and overlay flags

use super::binding::{KeyCombo, KeyEvent, ShortcutAction, ShortcutBinding};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Open/closed state of the dashboard overlays.
///
/// The flags are independent: several overlays may be open at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayState {
    pub search_open: bool,
    pub command_palette_open: bool,
    pub help_open: bool,
}

impl OverlayState {
    /// True if any overlay is open
    pub fn any_open(&self) -> bool {
        self.search_open || self.command_palette_open || self.help_open
    }
}

/// Runtime shortcut registry.
///
/// Bindings are keyed by the canonical text of their combo; registering the
/// same combo again replaces the earlier binding.
#[derive(Clone)]
pub struct ShortcutRegistry {
    shortcuts: Arc<Mutex<HashMap<String, ShortcutBinding>>>,
    overlays: Arc<watch::Sender<OverlayState>>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        let (overlays, _) = watch::channel(OverlayState::default());
        Self {
            shortcuts: Arc::new(Mutex::new(HashMap::new())),
            overlays: Arc::new(overlays),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ShortcutBinding>> {
        self.shortcuts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind `action` to `combo`, replacing any existing binding
    pub fn register_shortcut(&self, combo: KeyCombo, action: impl Fn() + Send + Sync + 'static) {
        let description = combo.to_string();
        self.register_binding(ShortcutBinding::new(combo, description, action));
    }

    /// Insert a prepared binding, replacing any existing one for its combo
    pub fn register_binding(&self, binding: ShortcutBinding) {
        let key = binding.combo.to_string();
        if self.lock().insert(key.clone(), binding).is_some() {
            tracing::debug!("Shortcut {} rebound", key);
        }
    }

    /// Remove the binding for `combo`. Returns true if one existed.
    pub fn unregister_shortcut(&self, combo: &KeyCombo) -> bool {
        self.lock().remove(&combo.to_string()).is_some()
    }

    /// True if `combo` is bound
    pub fn is_registered(&self, combo: &KeyCombo) -> bool {
        self.lock().contains_key(&combo.to_string())
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Combo and description of every binding, sorted by combo text
    pub fn describe(&self) -> Vec<(String, String)> {
        let mut listing: Vec<_> = self
            .lock()
            .iter()
            .map(|(key, binding)| (key.clone(), binding.description.clone()))
            .collect();
        listing.sort();
        listing
    }

    /// Actions whose combo matches `event`
    pub fn matching_actions(&self, event: &KeyEvent) -> Vec<ShortcutAction> {
        self.lock()
            .values()
            .filter(|binding| binding.combo.matches(event))
            .map(|binding| Arc::clone(&binding.action))
            .collect()
    }

    /// Current overlay flags
    pub fn overlays(&self) -> OverlayState {
        *self.overlays.borrow()
    }

    /// Receive overlay flags every time they change
    pub fn subscribe_overlays(&self) -> watch::Receiver<OverlayState> {
        self.overlays.subscribe()
    }

    fn set_overlay(&self, update: impl FnOnce(&mut OverlayState)) {
        self.overlays.send_if_modified(|state| {
            let before = *state;
            update(state);
            *state != before
        });
    }

    pub fn is_search_open(&self) -> bool {
        self.overlays().search_open
    }

    pub fn open_search(&self) {
        self.set_overlay(|s| s.search_open = true);
    }

    pub fn close_search(&self) {
        self.set_overlay(|s| s.search_open = false);
    }

    pub fn is_command_palette_open(&self) -> bool {
        self.overlays().command_palette_open
    }

    pub fn open_command_palette(&self) {
        self.set_overlay(|s| s.command_palette_open = true);
    }

    pub fn close_command_palette(&self) {
        self.set_overlay(|s| s.command_palette_open = false);
    }

    pub fn is_help_open(&self) -> bool {
        self.overlays().help_open
    }

    pub fn open_help(&self) {
        self.set_overlay(|s| s.help_open = true);
    }

    pub fn close_help(&self) {
        self.set_overlay(|s| s.help_open = false);
    }

    pub fn toggle_help(&self) {
        self.set_overlay(|s| s.help_open = !s.help_open);
    }

    /// Close search, command palette and help
    pub fn close_all_overlays(&self) {
        self.set_overlay(|s| *s = OverlayState::default());
    }
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShortcutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcutRegistry")
            .field("shortcuts", &self.describe())
            .field("overlays", &self.overlays())
            .finish()
    }
}
