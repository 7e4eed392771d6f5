//! In-process notification timers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;

use super::{NotificationRequest, NotificationScheduler};
use crate::error::{Error, Result};
use crate::models::NotificationHandle;

const HANDLE_PREFIX: &str = "deferred-";
const IMMEDIATE_PREFIX: &str = "deferred-immediate-";

/// Receives notifications once their timer fires.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Whether notifications may currently be shown.
    async fn permission(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> bool {
        self.permission().await
    }

    async fn deliver(&self, notification: &NotificationRequest);
}

/// Sink that writes delivered notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &NotificationRequest) {
        tracing::info!(
            reminder_id = %notification.data.reminder_id,
            priority = %notification.data.priority,
            "Reminder due: {} - {}",
            notification.title,
            notification.body
        );
    }
}

type Timers = Arc<Mutex<HashMap<u64, JoinHandle<()>>>>;

/// Scheduler backed by tokio timers. Pending notifications only fire while
/// the process that scheduled them is running.
pub struct DeferredScheduler {
    sink: Arc<dyn NotificationSink>,
    timers: Timers,
    next_id: AtomicU64,
}

impl DeferredScheduler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            timers: Arc::default(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of timers that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }

    fn abort_all(&self) -> usize {
        let mut timers = lock(&self.timers);
        let count = timers.len();
        for (_, timer) in timers.drain() {
            timer.abort();
        }
        count
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn timer_id(handle: &NotificationHandle) -> Option<u64> {
    let raw = handle.as_str();
    if raw.starts_with(IMMEDIATE_PREFIX) {
        return None;
    }
    raw.strip_prefix(HANDLE_PREFIX)?.parse().ok()
}

#[async_trait]
impl NotificationScheduler for DeferredScheduler {
    async fn request_permission(&self) -> Result<bool> {
        Ok(self.sink.request_permission().await)
    }

    async fn schedule(&self, request: &NotificationRequest) -> Result<NotificationHandle> {
        if !self.sink.permission().await {
            return Err(Error::Notification(
                "Notification permission not granted".to_string(),
            ));
        }

        let delay = request.trigger_at - Utc::now();
        let Ok(delay) = delay.to_std() else {
            self.sink.deliver(request).await;
            return Ok(NotificationHandle::new(format!(
                "{IMMEDIATE_PREFIX}{}",
                request.data.reminder_id
            )));
        };
        if delay.is_zero() {
            self.sink.deliver(request).await;
            return Ok(NotificationHandle::new(format!(
                "{IMMEDIATE_PREFIX}{}",
                request.data.reminder_id
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sink = Arc::clone(&self.sink);
        let timers = Arc::clone(&self.timers);
        let request = request.clone();

        // Held across spawn so the task cannot remove its entry before it exists.
        let mut pending = lock(&self.timers);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.deliver(&request).await;
            lock(&timers).remove(&id);
        });
        pending.insert(id, task);
        drop(pending);

        tracing::debug!(timer = id, ?delay, "Scheduled deferred notification");
        Ok(NotificationHandle::new(format!("{HANDLE_PREFIX}{id}")))
    }

    async fn cancel(&self, handle: &NotificationHandle) {
        let Some(id) = timer_id(handle) else {
            return;
        };
        if let Some(task) = lock(&self.timers).remove(&id) {
            task.abort();
            tracing::debug!(timer = id, "Cancelled deferred notification");
        }
    }

    async fn cancel_all(&self) {
        let count = self.abort_all();
        tracing::debug!(count, "Cancelled all deferred notifications");
    }

    async fn release(&self) {
        self.abort_all();
    }
}

impl Drop for DeferredScheduler {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, ReminderId};
    use crate::notify::NotificationData;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<NotificationRequest>>,
        denied: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn permission(&self) -> bool {
            !self.denied
        }

        async fn deliver(&self, notification: &NotificationRequest) {
            self.delivered.lock().unwrap().push(notification.clone());
        }
    }

    fn request(offset: ChronoDuration) -> NotificationRequest {
        NotificationRequest {
            title: "Stretch".to_string(),
            body: "Reminder notification".to_string(),
            trigger_at: Utc::now() + offset,
            data: NotificationData {
                reminder_id: ReminderId::new(),
                note_id: None,
                priority: Priority::Medium,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_delivers_at_trigger_time() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = DeferredScheduler::new(sink.clone());

        let handle = scheduler
            .schedule(&request(ChronoDuration::minutes(10)))
            .await
            .unwrap();
        assert!(handle.as_str().starts_with("deferred-"));
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_secs(5 * 60)).await;
        assert!(sink.delivered.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(6 * 60)).await;
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn past_trigger_delivers_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = DeferredScheduler::new(sink.clone());
        let request = request(ChronoDuration::minutes(-1));

        let handle = scheduler.schedule(&request).await.unwrap();
        assert_eq!(
            handle.as_str(),
            format!("deferred-immediate-{}", request.data.reminder_id)
        );
        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_ignores_unknown_handles() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = DeferredScheduler::new(sink.clone());
        let handle = scheduler
            .schedule(&request(ChronoDuration::minutes(1)))
            .await
            .unwrap();

        scheduler.cancel(&handle).await;
        scheduler.cancel(&handle).await;
        scheduler
            .cancel(&NotificationHandle::new("deferred-immediate-x"))
            .await;
        scheduler.cancel(&NotificationHandle::new("os-42")).await;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn release_drops_pending_timers() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = DeferredScheduler::new(sink.clone());
        for minutes in [1, 2, 3] {
            scheduler
                .schedule(&request(ChronoDuration::minutes(minutes)))
                .await
                .unwrap();
        }
        assert_eq!(scheduler.pending(), 3);

        scheduler.release().await;
        assert_eq!(scheduler.pending(), 0);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn denied_permission_fails_scheduling() {
        let sink = Arc::new(RecordingSink {
            denied: true,
            ..RecordingSink::default()
        });
        let scheduler = DeferredScheduler::new(sink);
        let error = scheduler
            .schedule(&request(ChronoDuration::minutes(5)))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Notification(_)));
    }
}
