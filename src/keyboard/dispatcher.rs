//! Key event bus and shortcut dispatcher

use super::binding::{KeyEvent, KeyPhase, ShortcutAction, ShortcutBinding};
use super::registry::ShortcutRegistry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Listener callback. Returns true to suppress the default action.
pub type KeyListener = Arc<dyn Fn(&KeyEvent) -> bool + Send + Sync>;

type ListenerMap = Mutex<BTreeMap<u64, KeyListener>>;

/// Process-wide source of key events.
///
/// Listeners are called in attach order. A listener added or removed while
/// an event is being delivered takes effect from the next event.
#[derive(Clone, Default)]
pub struct KeyEventBus {
    listeners: Arc<ListenerMap>,
    next_id: Arc<AtomicU64>,
}

impl KeyEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener. It stays attached until the guard is dropped.
    pub fn add_listener(&self, listener: impl Fn(&KeyEvent) -> bool + Send + Sync + 'static) -> ListenerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(listener));

        ListenerGuard {
            listeners: Arc::downgrade(&self.listeners),
            id,
            attached: true,
        }
    }

    /// Deliver an event to every listener.
    ///
    /// Returns true if any listener asked to suppress the default action.
    pub fn emit(&self, event: &KeyEvent) -> bool {
        let listeners: Vec<KeyListener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        let mut prevent_default = false;
        for listener in listeners {
            prevent_default |= listener(event);
        }
        prevent_default
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl fmt::Debug for KeyEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Keeps a listener attached. Detaches exactly once, on drop or `detach`.
#[must_use = "the listener is removed as soon as the guard is dropped"]
pub struct ListenerGuard {
    listeners: Weak<ListenerMap>,
    id: u64,
    attached: bool,
}

impl ListenerGuard {
    /// Detach now
    pub fn detach(mut self) {
        self.remove();
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    fn remove(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;

        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.id);
            tracing::debug!("Key listener {} detached", self.id);
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .field("attached", &self.attached)
            .finish()
    }
}

/// Result of dispatching one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of actions invoked
    pub fired: usize,
}

impl DispatchOutcome {
    /// The default action is suppressed whenever something matched
    pub fn prevent_default(&self) -> bool {
        self.fired > 0
    }
}

/// Matches key-down events against bindings and runs their actions.
///
/// Bindings come from a fixed list supplied at construction and, optionally,
/// from a [`ShortcutRegistry`] consulted on every event. Every matching
/// binding fires; there is no early exit.
#[derive(Clone, Default)]
pub struct KeyboardDispatcher {
    static_bindings: Arc<Vec<ShortcutBinding>>,
    registry: Option<ShortcutRegistry>,
}

impl KeyboardDispatcher {
    /// Dispatcher over a fixed binding list
    pub fn new(static_bindings: Vec<ShortcutBinding>) -> Self {
        Self {
            static_bindings: Arc::new(static_bindings),
            registry: None,
        }
    }

    /// Also consult `registry` on every event
    pub fn with_registry(mut self, registry: ShortcutRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run every action matching `event`
    pub fn dispatch(&self, event: &KeyEvent) -> DispatchOutcome {
        if event.phase != KeyPhase::Down {
            return DispatchOutcome::default();
        }

        let mut actions: Vec<ShortcutAction> = self
            .static_bindings
            .iter()
            .filter(|binding| binding.combo.matches(event))
            .map(|binding| Arc::clone(&binding.action))
            .collect();

        if let Some(registry) = &self.registry {
            actions.extend(registry.matching_actions(event));
        }

        // Actions run with no locks held so they may touch the registry
        for action in &actions {
            action();
        }

        if !actions.is_empty() {
            tracing::trace!("Key {:?} fired {} shortcut(s)", event.key, actions.len());
        }

        DispatchOutcome { fired: actions.len() }
    }

    /// Listen on `bus` until the returned guard is dropped
    pub fn attach(&self, bus: &KeyEventBus) -> ListenerGuard {
        let dispatcher = self.clone();
        let guard = bus.add_listener(move |event| dispatcher.dispatch(event).prevent_default());
        tracing::debug!("Keyboard dispatcher attached");
        guard
    }
}

impl fmt::Debug for KeyboardDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardDispatcher")
            .field("static_bindings", &self.static_bindings.len())
            .field("registry", &self.registry.is_some())
            .finish()
    }
}
