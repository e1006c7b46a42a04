//! Periodic merge of simulated deltas into the dashboard stats

use super::delta::{DeltaSource, RandomDeltas};
use super::stats::StatsStore;
use crate::schedule::SharedClock;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant as TokioInstant, MissedTickBehavior};

/// Default poller period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Disabled,
    Enabled,
}

/// Timer-driven updater for [`StatsStore`].
///
/// While enabled a tokio task ticks once per period. Each tick draws one
/// delta and applies it atomically; a zero delta leaves the store (and its
/// timestamp) alone. Disabling or dropping the poller aborts the task
/// between ticks, so a tick is either fully applied or not at all.
pub struct RealTimePoller {
    stats: StatsStore,
    source: Arc<Mutex<Box<dyn DeltaSource>>>,
    clock: SharedClock,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl RealTimePoller {
    /// Poller with random deltas and the default period
    pub fn new(stats: StatsStore, clock: SharedClock) -> Self {
        Self::with_source(stats, clock, RandomDeltas::new())
    }

    /// Poller with a custom delta source
    pub fn with_source(stats: StatsStore, clock: SharedClock, source: impl DeltaSource + 'static) -> Self {
        Self {
            stats,
            source: Arc::new(Mutex::new(Box::new(source))),
            clock,
            period: DEFAULT_POLL_INTERVAL,
            task: None,
        }
    }

    /// Change the period. Takes effect the next time the poller is enabled.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period.max(Duration::from_millis(1));
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> PollerState {
        if self.task.is_some() {
            PollerState::Enabled
        } else {
            PollerState::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == PollerState::Enabled
    }

    /// Follow the external enabled flag.
    ///
    /// Enabling while enabled, or disabling while disabled, changes nothing.
    /// Must be called from within a tokio runtime when enabling.
    pub fn set_enabled(&mut self, enabled: bool) {
        match (enabled, self.task.is_some()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let stats = self.stats.clone();
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let period = self.period;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(TokioInstant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick(&stats, &source, &clock);
            }
        }));

        tracing::info!("Real-time updates enabled (every {})", humantime::format_duration(period));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Real-time updates disabled");
        }
    }

    /// Run one tick immediately, independent of the timer.
    ///
    /// Returns true if the stats changed.
    pub fn tick_now(&self) -> bool {
        tick(&self.stats, &self.source, &self.clock)
    }
}

fn tick(stats: &StatsStore, source: &Mutex<Box<dyn DeltaSource>>, clock: &SharedClock) -> bool {
    let delta = source.lock().unwrap_or_else(|e| e.into_inner()).next_delta();
    if delta.is_zero() {
        tracing::trace!("Real-time tick: no change");
        return false;
    }
    let applied = stats.apply(delta, clock.wall());
    tracing::debug!("Real-time tick applied {}", delta);
    applied
}

impl Drop for RealTimePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RealTimePoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealTimePoller")
            .field("state", &self.state())
            .field("period", &self.period)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{DashboardStats, ScriptedDeltas, StatsDelta};
    use crate::schedule::{Clock, ManualClock, SystemClock};

    fn seeded_store() -> StatsStore {
        StatsStore::new(DashboardStats {
            total_requests: 100,
            pending_requests: 10,
            active_providers: 20,
            last_update: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_after_one_period_applies_nonzero_delta() {
        let stats = seeded_store();
        let mut poller = RealTimePoller::with_source(
            stats.clone(),
            SystemClock::shared(),
            ScriptedDeltas::new([StatsDelta::new(1, -1, 1)]),
        );
        poller.set_enabled(true);

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(stats.snapshot().last_update, None);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let snap = stats.snapshot();
        assert!(snap.last_update.is_some());
        assert_eq!((snap.total_requests, snap.pending_requests, snap.active_providers), (101, 9, 21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delta_tick_is_noop() {
        let stats = seeded_store();
        let mut poller = RealTimePoller::with_source(
            stats.clone(),
            SystemClock::shared(),
            ScriptedDeltas::new([StatsDelta::ZERO, StatsDelta::new(0, 0, 1)]),
        );
        let rx = stats.subscribe();
        poller.set_enabled(true);

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(stats.snapshot(), seeded_store().snapshot());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(stats.snapshot().active_providers, 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_poller_never_ticks() {
        let stats = seeded_store();
        let poller = RealTimePoller::with_source(
            stats.clone(),
            SystemClock::shared(),
            ScriptedDeltas::new([StatsDelta::new(1, 1, 1)]),
        );
        assert_eq!(poller.state(), PollerState::Disabled);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(stats.snapshot(), seeded_store().snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_cancels_and_reenable_restarts_cycle() {
        let stats = seeded_store();
        let mut poller = RealTimePoller::with_source(
            stats.clone(),
            SystemClock::shared(),
            ScriptedDeltas::new(std::iter::repeat(StatsDelta::new(1, 0, 0)).take(10)),
        );

        poller.set_enabled(true);
        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(stats.snapshot().total_requests, 101);

        poller.set_enabled(false);
        assert!(!poller.is_enabled());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(stats.snapshot().total_requests, 101);

        // Fresh cycle: nothing until a full period after re-enabling
        poller.set_enabled(true);
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(stats.snapshot().total_requests, 101);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(stats.snapshot().total_requests, 102);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let stats = seeded_store();
        {
            let mut poller = RealTimePoller::with_source(
                stats.clone(),
                SystemClock::shared(),
                ScriptedDeltas::new([StatsDelta::new(1, 0, 0)]),
            );
            poller.set_enabled(true);
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stats.snapshot().total_requests, 100);
    }

    #[test]
    fn test_tick_now_stamps_with_clock() {
        let clock = ManualClock::shared();
        let stats = seeded_store();
        let poller = RealTimePoller::with_source(
            stats.clone(),
            clock.clone(),
            ScriptedDeltas::new([StatsDelta::new(0, 1, 0), StatsDelta::ZERO]),
        );

        assert!(poller.tick_now());
        assert_eq!(stats.snapshot().last_update, Some(clock.wall()));

        clock.advance(Duration::from_secs(5));
        assert!(!poller.tick_now());
        assert_ne!(stats.snapshot().last_update, Some(clock.wall()));
    }

    #[test]
    fn test_period_floor() {
        let poller = RealTimePoller::new(StatsStore::default(), SystemClock::shared())
            .with_period(Duration::ZERO);
        assert_eq!(poller.period(), Duration::from_millis(1));
    }
}
