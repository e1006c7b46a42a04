//! Shared dashboard counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Headline counters shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_requests: u64,
    pub pending_requests: u64,
    pub active_providers: u64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Signed change to apply to [`DashboardStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDelta {
    pub total_requests: i64,
    pub pending_requests: i64,
    pub active_providers: i64,
}

impl StatsDelta {
    pub const ZERO: StatsDelta = StatsDelta {
        total_requests: 0,
        pending_requests: 0,
        active_providers: 0,
    };

    pub fn new(total_requests: i64, pending_requests: i64, active_providers: i64) -> Self {
        Self {
            total_requests,
            pending_requests,
            active_providers,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for StatsDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total {:+}, pending {:+}, providers {:+}",
            self.total_requests, self.pending_requests, self.active_providers
        )
    }
}

fn offset(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

impl DashboardStats {
    /// Apply a delta and stamp `last_update`.
    ///
    /// Counters never go below zero. A zero delta leaves everything,
    /// including the timestamp, untouched; the return value says whether
    /// anything was applied.
    pub fn apply(&mut self, delta: StatsDelta, at: DateTime<Utc>) -> bool {
        if delta.is_zero() {
            return false;
        }
        self.total_requests = offset(self.total_requests, delta.total_requests);
        self.pending_requests = offset(self.pending_requests, delta.pending_requests);
        self.active_providers = offset(self.active_providers, delta.active_providers);
        self.last_update = Some(at);
        true
    }
}

/// Shared, observable [`DashboardStats`]
#[derive(Clone)]
pub struct StatsStore {
    state: Arc<watch::Sender<DashboardStats>>,
}

impl StatsStore {
    pub fn new(initial: DashboardStats) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
        }
    }

    /// Current counters
    pub fn snapshot(&self) -> DashboardStats {
        self.state.borrow().clone()
    }

    /// Replace the counters wholesale, e.g. after a fresh fetch
    pub fn replace(&self, stats: DashboardStats) {
        self.state.send_replace(stats);
    }

    /// Apply `delta`; subscribers are notified only if something changed
    pub fn apply(&self, delta: StatsDelta, at: DateTime<Utc>) -> bool {
        self.state.send_if_modified(|stats| stats.apply(delta, at))
    }

    /// Receive the counters every time they change
    pub fn subscribe(&self) -> watch::Receiver<DashboardStats> {
        self.state.subscribe()
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new(DashboardStats::default())
    }
}

impl fmt::Debug for StatsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatsStore").field(&self.snapshot()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u64, pending: u64, providers: u64) -> DashboardStats {
        DashboardStats {
            total_requests: total,
            pending_requests: pending,
            active_providers: providers,
            last_update: None,
        }
    }

    #[test]
    fn test_apply_adds_and_stamps() {
        let mut s = stats(10, 3, 4);
        let at = Utc::now();
        assert!(s.apply(StatsDelta::new(1, -1, 1), at));
        assert_eq!((s.total_requests, s.pending_requests, s.active_providers), (11, 2, 5));
        assert_eq!(s.last_update, Some(at));
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut s = stats(10, 3, 4);
        assert!(!s.apply(StatsDelta::ZERO, Utc::now()));
        assert_eq!(s, stats(10, 3, 4));
    }

    #[test]
    fn test_counters_clamp_at_zero() {
        let mut s = stats(0, 0, 0);
        assert!(s.apply(StatsDelta::new(-1, -1, 0), Utc::now()));
        assert_eq!((s.total_requests, s.pending_requests), (0, 0));
        assert!(s.last_update.is_some());
    }

    #[test]
    fn test_store_notifies_only_on_change() {
        let store = StatsStore::new(stats(5, 5, 5));
        let mut rx = store.subscribe();

        assert!(!store.apply(StatsDelta::ZERO, Utc::now()));
        assert!(!rx.has_changed().unwrap());

        assert!(store.apply(StatsDelta::new(0, 0, 1), Utc::now()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().active_providers, 6);
    }

    #[test]
    fn test_camel_case_json() {
        let json = serde_json::to_value(stats(1, 2, 3)).unwrap();
        assert_eq!(json["totalRequests"], 1);
        assert_eq!(json["pendingRequests"], 2);
        assert_eq!(json["activeProviders"], 3);
        assert!(json["lastUpdate"].is_null());
    }
}
