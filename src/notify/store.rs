//! Notification store with timed self-expiry

use crate::error::DjobeaError;
use crate::schedule::{SharedClock, TimerQueue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Notify};

/// Default lifetime of a notification
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

/// Opaque notification identifier, unique per store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotificationId(u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n-{}", self.0)
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(name)
    }
}

/// A notification currently held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// A notification before it has been shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// `None` uses the store's default duration
    pub duration: Option<Duration>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            duration: None,
        }
    }

    /// Override the lifetime. Zero is bumped to one millisecond.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration.max(Duration::from_millis(1)));
        self
    }
}

#[derive(Debug)]
struct StoreInner {
    items: Vec<Notification>,
    expiries: TimerQueue<NotificationId>,
    next_id: u64,
}

/// Ordered list of self-expiring notifications.
///
/// Cloning yields another handle to the same store. Every visible change
/// is published to receivers obtained from [`subscribe`](Self::subscribe).
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Mutex<StoreInner>>,
    updates: Arc<watch::Sender<Vec<Notification>>>,
    rescheduled: Arc<Notify>,
    clock: SharedClock,
    default_duration: Duration,
}

impl NotificationStore {
    /// Create an empty store on the given clock
    pub fn new(clock: SharedClock) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                items: Vec::new(),
                expiries: TimerQueue::new(),
                next_id: 1,
            })),
            updates: Arc::new(updates),
            rescheduled: Arc::new(Notify::new()),
            clock,
            default_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }

    /// Use a different default lifetime for drafts without one
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration.max(Duration::from_millis(1));
        self
    }

    /// Default lifetime applied to drafts without one
    pub fn default_duration(&self) -> Duration {
        self.default_duration
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, items: &[Notification]) {
        self.updates.send_replace(items.to_vec());
    }

    /// Append a notification and schedule its removal
    pub fn show(&self, draft: NotificationDraft) -> NotificationId {
        let duration = draft.duration.unwrap_or(self.default_duration);
        let deadline = self.clock.now() + duration;

        let mut inner = self.lock();
        let id = NotificationId(inner.next_id);
        inner.next_id += 1;

        inner.items.push(Notification {
            id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            duration,
        });
        inner.expiries.schedule(id, deadline);
        self.publish(&inner.items);
        drop(inner);

        tracing::debug!("Notification {} shown for {:?}", id, duration);
        self.rescheduled.notify_one();
        id
    }

    /// Show a success notification
    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.show(NotificationDraft::new(NotificationKind::Success, title, message))
    }

    /// Show an error notification
    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.show(NotificationDraft::new(NotificationKind::Error, title, message))
    }

    /// Show a warning notification
    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.show(NotificationDraft::new(NotificationKind::Warning, title, message))
    }

    /// Show an info notification
    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.show(NotificationDraft::new(NotificationKind::Info, title, message))
    }

    /// Surface an error to the user
    pub fn report_error(&self, err: &DjobeaError) -> NotificationId {
        self.error(err.title(), err.to_string())
    }

    /// Remove a notification. Unknown ids are ignored.
    pub fn remove(&self, id: NotificationId) {
        let mut inner = self.lock();
        inner.expiries.cancel(&id);

        let before = inner.items.len();
        inner.items.retain(|n| n.id != id);
        if inner.items.len() != before {
            self.publish(&inner.items);
        }
    }

    /// Remove every notification
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.expiries.clear();
        if !inner.items.is_empty() {
            inner.items.clear();
            self.publish(&inner.items);
        }
    }

    /// Remove every notification whose lifetime has elapsed.
    ///
    /// Returns the number removed.
    pub fn expire_due(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.lock();

        let due = inner.expiries.pop_due(now);
        if due.is_empty() {
            return 0;
        }

        let before = inner.items.len();
        inner.items.retain(|n| !due.contains(&n.id));
        let removed = before - inner.items.len();
        if removed > 0 {
            self.publish(&inner.items);
        }
        drop(inner);

        tracing::debug!("Expired {} notification(s)", removed);
        removed
    }

    /// Earliest pending expiry
    pub fn next_expiry(&self) -> Option<Instant> {
        self.lock().expiries.next_deadline()
    }

    /// Number of scheduled expiries
    pub fn pending_expiries(&self) -> usize {
        self.lock().expiries.len()
    }

    /// Snapshot of the visible notifications in display order
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().items.clone()
    }

    /// Look up a notification by id
    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.lock().items.iter().find(|n| n.id == id).cloned()
    }

    /// Number of visible notifications
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// True when nothing is visible
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Receive the visible list every time it changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.updates.subscribe()
    }

    /// Signalled whenever a new expiry is scheduled
    pub(crate) fn rescheduled(&self) -> Arc<Notify> {
        Arc::clone(&self.rescheduled)
    }
}

impl fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStore")
            .field("len", &self.len())
            .field("default_duration", &self.default_duration)
            .finish()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ManualClock;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn store() -> (NotificationStore, Arc<ManualClock>) {
        let clock = ManualClock::shared();
        (NotificationStore::new(clock.clone()), clock)
    }

    #[test]
    fn test_show_assigns_default_duration() {
        let (store, _) = store();
        let id = store.info("Saved", "Provider updated");

        let shown = store.get(id).unwrap();
        assert_eq!(shown.duration, Duration::from_millis(5000));
        assert_eq!(shown.kind, NotificationKind::Info);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_display_order_is_insertion_order() {
        let (store, _) = store();
        let a = store.success("a", "");
        let b = store.error("b", "");
        let c = store.warning("c", "");

        let ids: Vec<_> = store.notifications().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_auto_dismissal_after_duration() {
        let (store, clock) = store();
        let id = store.show(
            NotificationDraft::new(NotificationKind::Success, "Done", "Request closed")
                .with_duration(Duration::from_millis(100)),
        );

        assert!(store.get(id).is_some());

        clock.advance(Duration::from_millis(99));
        assert_eq!(store.expire_due(), 0);
        assert!(store.get(id).is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.expire_due(), 1);
        assert!(store.get(id).is_none());
    }

    #[test]
    fn test_remove_is_idempotent_and_cancels_expiry() {
        let (store, clock) = store();
        let keep = store.info("keep", "");
        let gone = store.info("gone", "");

        store.remove(gone);
        store.remove(gone);
        assert_eq!(store.len(), 1);
        assert_eq!(store.pending_expiries(), 1);

        clock.advance(Duration::from_secs(10));
        assert_eq!(store.expire_due(), 1);
        assert!(store.get(keep).is_none());
    }

    #[test]
    fn test_clear_all_empties_regardless_of_pending() {
        let (store, clock) = store();
        for i in 0..25 {
            store.info(format!("n{}", i), "");
        }

        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.pending_expiries(), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(store.expire_due(), 0);
    }

    #[test]
    fn test_subscribers_see_each_change() {
        let (store, _) = store();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        let id = store.info("hello", "");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.remove(id);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());

        // Removing an unknown id publishes nothing
        store.remove(id);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_report_error_uses_error_kind() {
        let (store, _) = store();
        let id = store.report_error(&DjobeaError::config("port must be non-zero"));
        let n = store.get(id).unwrap();
        assert_eq!(n.kind, NotificationKind::Error);
        assert_eq!(n.title, "Configuration error");
        assert!(n.message.contains("port must be non-zero"));
    }

    #[test]
    fn test_serialized_shape() {
        let (store, _) = store();
        let id = store.warning("Low balance", "Provider wallet below threshold");
        let json = serde_json::to_value(store.get(id).unwrap()).unwrap();
        assert_eq!(json["kind"], "warning");
        assert_eq!(json["duration"], 5000);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Show(u64),
        RemoveNth(usize),
        Advance(u64),
        ClearAll,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (1u64..500).prop_map(Op::Show),
            2 => (0usize..8).prop_map(Op::RemoveNth),
            2 => (0u64..300).prop_map(Op::Advance),
            1 => Just(Op::ClearAll),
        ]
    }

    proptest! {
        #[test]
        fn prop_len_tracks_shows_minus_removals(ops in proptest::collection::vec(op(), 0..60)) {
            let (store, clock) = store();
            let mut shown = 0usize;
            let mut removed = 0usize;
            let mut ever_seen = HashSet::new();

            for op in ops {
                match op {
                    Op::Show(ms) => {
                        let id = store.show(
                            NotificationDraft::new(NotificationKind::Info, "t", "m")
                                .with_duration(Duration::from_millis(ms)),
                        );
                        prop_assert!(ever_seen.insert(id));
                        shown += 1;
                    }
                    Op::RemoveNth(n) => {
                        if let Some(target) = store.notifications().get(n).map(|x| x.id) {
                            store.remove(target);
                            removed += 1;
                        }
                    }
                    Op::Advance(ms) => {
                        clock.advance(Duration::from_millis(ms));
                        removed += store.expire_due();
                    }
                    Op::ClearAll => {
                        removed += store.len();
                        store.clear_all();
                    }
                }

                let items = store.notifications();
                prop_assert_eq!(items.len(), shown - removed);
                let distinct: HashSet<_> = items.iter().map(|n| n.id).collect();
                prop_assert_eq!(distinct.len(), items.len());
            }
        }
    }
}
