//! Application root
//!
//! [`DashboardContext`] owns one instance of every store and hands out
//! cloneable handles to them. Background work (notification expiry,
//! keyboard listening, real-time polling) runs only between
//! [`DashboardContext::start`] and [`DashboardContext::stop`] or drop.

use crate::config::DashboardConfig;
use crate::keyboard::{
    register_default_shortcuts, KeyEventBus, KeyboardDispatcher, ListenerGuard, ShortcutBinding, ShortcutRegistry,
};
use crate::notify::{spawn_expiry_driver, ExpiryDriver, NotificationStore};
use crate::realtime::{DashboardStats, DeltaSource, RandomDeltas, RealTimePoller, StatsStore};
use crate::schedule::{SharedClock, SystemClock};
use tracing::info;

/// Builder for [`DashboardContext`]
pub struct DashboardContextBuilder {
    config: DashboardConfig,
    clock: SharedClock,
    deltas: Box<dyn DeltaSource>,
    static_bindings: Vec<ShortcutBinding>,
    initial_stats: DashboardStats,
}

impl DashboardContextBuilder {
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn delta_source(mut self, source: impl DeltaSource + 'static) -> Self {
        self.deltas = Box::new(source);
        self
    }

    /// Bindings that always apply, regardless of the registry contents
    pub fn static_bindings(mut self, bindings: Vec<ShortcutBinding>) -> Self {
        self.static_bindings = bindings;
        self
    }

    pub fn initial_stats(mut self, stats: DashboardStats) -> Self {
        self.initial_stats = stats;
        self
    }

    pub fn build(self) -> DashboardContext {
        let notifications = NotificationStore::new(self.clock.clone())
            .with_default_duration(self.config.notifications.default_duration);

        let shortcuts = ShortcutRegistry::new();
        register_default_shortcuts(&shortcuts);
        for setting in &self.config.shortcuts {
            setting.command.bind(&shortcuts, setting.combo.clone());
        }

        let stats = StatsStore::new(self.initial_stats);
        let poller = RealTimePoller::with_source(stats.clone(), self.clock.clone(), self.deltas)
            .with_period(self.config.realtime.interval);

        let dispatcher = KeyboardDispatcher::new(self.static_bindings).with_registry(shortcuts.clone());

        DashboardContext {
            config: self.config,
            clock: self.clock,
            notifications,
            shortcuts,
            stats,
            bus: KeyEventBus::new(),
            dispatcher,
            poller,
            expiry: None,
            listener: None,
        }
    }
}

/// Owner of the dashboard stores and their background tasks
pub struct DashboardContext {
    config: DashboardConfig,
    clock: SharedClock,
    notifications: NotificationStore,
    shortcuts: ShortcutRegistry,
    stats: StatsStore,
    bus: KeyEventBus,
    dispatcher: KeyboardDispatcher,
    poller: RealTimePoller,
    expiry: Option<ExpiryDriver>,
    listener: Option<ListenerGuard>,
}

impl DashboardContext {
    pub fn builder(config: DashboardConfig) -> DashboardContextBuilder {
        DashboardContextBuilder {
            config,
            clock: SystemClock::shared(),
            deltas: Box::new(RandomDeltas::new()),
            static_bindings: Vec::new(),
            initial_stats: DashboardStats::default(),
        }
    }

    /// Context with the system clock and random deltas
    pub fn new(config: DashboardConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Key event source; emit here to drive the dispatcher
    pub fn key_bus(&self) -> &KeyEventBus {
        &self.bus
    }

    pub fn dispatcher(&self) -> &KeyboardDispatcher {
        &self.dispatcher
    }

    pub fn is_started(&self) -> bool {
        self.listener.is_some()
    }

    pub fn is_realtime_enabled(&self) -> bool {
        self.poller.is_enabled()
    }

    /// Start background work. Must be called within a tokio runtime.
    ///
    /// Starting twice is a no-op.
    pub fn start(&mut self) {
        if self.is_started() {
            return;
        }
        self.expiry = Some(spawn_expiry_driver(self.notifications.clone()));
        self.listener = Some(self.dispatcher.attach(&self.bus));
        self.poller.set_enabled(self.config.realtime.enabled);
        info!(
            "Dashboard started ({} shortcuts, real-time {})",
            self.shortcuts.len(),
            if self.poller.is_enabled() { "on" } else { "off" }
        );
    }

    /// Follow the real-time toggle
    pub fn set_realtime(&mut self, enabled: bool) {
        self.poller.set_enabled(enabled);
    }

    /// Stop background work. Store contents are kept.
    pub fn stop(&mut self) {
        if !self.is_started() {
            return;
        }
        self.poller.set_enabled(false);
        if let Some(listener) = self.listener.take() {
            listener.detach();
        }
        self.expiry = None;
        info!("Dashboard stopped");
    }
}

impl Drop for DashboardContext {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShortcutSetting;
    use crate::keyboard::{KeyCombo, KeyEvent, ShortcutCommand};
    use crate::realtime::{ScriptedDeltas, StatsDelta};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn quiet_config() -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config.realtime.enabled = false;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_drive_overlays_once_started() {
        let mut ctx = DashboardContext::new(quiet_config());
        let bus = ctx.key_bus().clone();

        assert!(!bus.emit(&KeyEvent::down("k").ctrl()));
        assert!(!ctx.shortcuts().is_search_open());

        ctx.start();
        assert!(bus.emit(&KeyEvent::down("K").ctrl()));
        assert!(ctx.shortcuts().is_search_open());

        bus.emit(&KeyEvent::down("p").meta().shift());
        assert!(ctx.shortcuts().is_command_palette_open());

        bus.emit(&KeyEvent::down("escape"));
        assert!(!ctx.shortcuts().overlays().any_open());

        ctx.stop();
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_shortcut_replaces_stock_binding() {
        let mut config = quiet_config();
        config.shortcuts.push(ShortcutSetting {
            combo: KeyCombo::new("k").ctrl(),
            command: ShortcutCommand::ToggleHelp,
        });
        let mut ctx = DashboardContext::new(config);
        ctx.start();

        ctx.key_bus().emit(&KeyEvent::down("k").ctrl());
        assert!(ctx.shortcuts().is_help_open());
        assert!(!ctx.shortcuts().is_search_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_bindings_fire_with_registry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut ctx = DashboardContext::builder(quiet_config())
            .static_bindings(vec![ShortcutBinding::new(KeyCombo::new("k").ctrl(), "count", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })])
            .build();
        ctx.start();

        ctx.key_bus().emit(&KeyEvent::down("k").ctrl());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(ctx.shortcuts().is_search_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifications_expire_after_start() {
        let mut config = quiet_config();
        config.notifications.default_duration = Duration::from_millis(100);
        let mut ctx = DashboardContext::new(config);
        ctx.start();

        ctx.notifications().success("Saved", "Provider updated");
        assert_eq!(ctx.notifications().len(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(ctx.notifications().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_follows_config_and_toggle() {
        let mut config = DashboardConfig::default();
        config.realtime.interval = Duration::from_secs(1);
        let mut ctx = DashboardContext::builder(config)
            .delta_source(ScriptedDeltas::new([StatsDelta::new(2, 1, 1), StatsDelta::new(1, 0, 0)]))
            .initial_stats(DashboardStats {
                total_requests: 10,
                ..Default::default()
            })
            .build();

        ctx.start();
        assert!(ctx.is_realtime_enabled());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(ctx.stats().snapshot().total_requests, 12);

        ctx.set_realtime(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ctx.stats().snapshot().total_requests, 12);
    }
}
