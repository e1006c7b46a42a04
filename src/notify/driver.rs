//! Background task that expires notifications on time

use super::store::NotificationStore;
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;

/// Handle to a running expiry task. Dropping it stops the task.
#[derive(Debug)]
pub struct ExpiryDriver {
    task: Option<JoinHandle<()>>,
}

impl ExpiryDriver {
    /// Stop the task
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Notification expiry driver stopped");
        }
    }

    /// True while the task is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ExpiryDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a task that removes notifications when their lifetime ends.
///
/// The task sleeps until the earliest deadline and wakes early whenever a
/// notification is shown. Must be called from within a tokio runtime.
pub fn spawn_expiry_driver(store: NotificationStore) -> ExpiryDriver {
    let wake = store.rescheduled();

    let task = tokio::spawn(async move {
        loop {
            store.expire_due();

            // Register interest before reading the deadline so a concurrent
            // `show` cannot slip between the two.
            let notified = wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match store.next_expiry() {
                Some(deadline) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(TokioInstant::from_std(deadline)) => {}
                        _ = &mut notified => {}
                    }
                }
                None => notified.await,
            }
        }
    });

    tracing::debug!("Notification expiry driver started");
    ExpiryDriver { task: Some(task) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotificationDraft, NotificationKind};
    use crate::schedule::SystemClock;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_driver_removes_after_duration() {
        let store = NotificationStore::new(SystemClock::shared());
        let _driver = spawn_expiry_driver(store.clone());

        let id = store.show(
            NotificationDraft::new(NotificationKind::Info, "Synced", "")
                .with_duration(Duration::from_millis(100)),
        );
        assert!(store.get(id).is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get(id).is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.get(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_picks_up_earlier_deadline() {
        let store = NotificationStore::new(SystemClock::shared());
        let _driver = spawn_expiry_driver(store.clone());

        let slow = store.info("slow", "");
        tokio::task::yield_now().await;
        let fast = store.show(
            NotificationDraft::new(NotificationKind::Error, "fast", "")
                .with_duration(Duration::from_millis(10)),
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get(fast).is_none());
        assert!(store.get(slow).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_driver_leaves_store_alone() {
        let store = NotificationStore::new(SystemClock::shared());
        let mut driver = spawn_expiry_driver(store.clone());
        driver.stop();
        assert!(!driver.is_running());

        let id = store.show(
            NotificationDraft::new(NotificationKind::Info, "x", "")
                .with_duration(Duration::from_millis(5)),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get(id).is_some());
        assert_eq!(store.expire_due(), 1);
    }
}
