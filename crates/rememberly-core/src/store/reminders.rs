//! Reminder cache with notification bookkeeping.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;

use super::{require_user, HasStatus, RequestTracker, StoreStatus, WriteReplay};
use crate::auth::SessionSource;
use crate::error::{Error, Result};
use crate::gateway::RemoteGateway;
use crate::models::{
    partition_due, NewReminder, NotificationHandle, Reminder, ReminderId, ReminderInsert,
    ReminderPatch,
};
use crate::notify::{NotificationRequest, NotificationScheduler};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderState {
    /// Active reminders, earliest first.
    pub reminders: Vec<Reminder>,
    pub status: StoreStatus,
}

impl HasStatus for ReminderState {
    fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }
}

/// Active reminders of the signed-in user.
///
/// Each cached reminder holds at most one live notification handle; the old
/// one is cancelled before a replacement is scheduled.
pub struct ReminderStore {
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<dyn SessionSource>,
    scheduler: Arc<dyn NotificationScheduler>,
    state: watch::Sender<ReminderState>,
    tracker: RequestTracker,
    replay: WriteReplay<ReminderState>,
}

impl ReminderStore {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        session: Arc<dyn SessionSource>,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        Self {
            gateway,
            session,
            scheduler,
            state: watch::channel(ReminderState::default()).0,
            tracker: RequestTracker::default(),
            replay: WriteReplay::default(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ReminderState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReminderState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn reminder(&self, id: &ReminderId) -> Option<Reminder> {
        self.state
            .borrow()
            .reminders
            .iter()
            .find(|reminder| reminder.id == *id)
            .cloned()
    }

    /// Cached reminders split into overdue and upcoming relative to `now`.
    #[must_use]
    pub fn overdue_and_upcoming(&self, now: DateTime<Utc>) -> (Vec<Reminder>, Vec<Reminder>) {
        partition_due(&self.state.borrow().reminders, now)
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| {
            state.status.error = None;
            state.status.is_offline = false;
        });
    }

    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.reminders.clear();
            state.status.error = None;
            state.status.is_offline = false;
        });
    }

    /// Replace the cache with the user's non-completed reminders.
    ///
    /// Superseded by a newer fetch, the result is discarded.
    pub async fn fetch_reminders(&self) -> Result<Vec<Reminder>> {
        let ticket = self.tracker.begin_fetch(&self.state);
        self.replay.open(ticket);
        let result = match require_user(&self.session).await {
            Ok(user_id) => self.gateway.list_active_reminders(&user_id).await,
            Err(error) => Err(error),
        };

        if !self.tracker.is_latest_fetch(ticket) {
            tracing::debug!("Discarding superseded reminders fetch");
            self.tracker.settle(&self.state, None, |_| {});
            self.replay.close(ticket);
            return result;
        }

        let result = result.map(|mut reminders| {
            reminders.retain(|reminder| !reminder.is_completed);
            reminders.sort_by_key(|reminder| reminder.remind_at);
            reminders
        });
        let outcome = self.tracker.finish(&self.state, result, |state, reminders| {
            if !self.tracker.is_latest_fetch(ticket) {
                return;
            }
            state.reminders.clone_from(reminders);
            self.replay.replay_onto(ticket, state);
            state.reminders.sort_by_key(|reminder| reminder.remind_at);
        });
        self.replay.close(ticket);
        outcome
    }

    /// Store a new reminder and schedule its notification.
    ///
    /// A scheduling failure is logged and the reminder is kept without a handle.
    pub async fn create_reminder(&self, reminder: NewReminder) -> Result<Reminder> {
        let _ticket = self.tracker.begin(&self.state);
        let result = self.insert_and_schedule(&reminder).await;

        self.tracker.finish(&self.state, result, |state, created| {
            tracing::info!(reminder_id = %created.id, remind_at = %created.remind_at, "Created reminder");
            let created = created.clone();
            self.replay.apply(state, move |state| {
                if !state.reminders.iter().any(|cached| cached.id == created.id) {
                    insert_sorted(&mut state.reminders, created.clone());
                }
            });
        })
    }

    async fn insert_and_schedule(&self, reminder: &NewReminder) -> Result<Reminder> {
        reminder.validate(Utc::now())?;
        let user_id = require_user(&self.session).await?;
        let mut created = self
            .gateway
            .insert_reminder(&ReminderInsert::from_new(user_id, reminder))
            .await?;

        if let Some(handle) = self.schedule_for(&created).await {
            if let Err(error) = self
                .gateway
                .update_reminder(&created.id, &ReminderPatch::notification(Some(handle.clone())))
                .await
            {
                tracing::warn!(
                    reminder_id = %created.id,
                    "Failed to store notification handle: {}",
                    error
                );
            }
            created.notification_id = Some(handle);
        }
        Ok(created)
    }

    /// Mark a reminder completed and drop it from the cache.
    pub async fn complete_reminder(&self, id: &ReminderId) -> Result<()> {
        let _ticket = self.tracker.begin(&self.state);
        let result = match require_user(&self.session).await {
            Ok(_) => {
                self.cancel_cached_handle(id).await;
                self.gateway
                    .update_reminder(id, &ReminderPatch::completed())
                    .await
            }
            Err(error) => Err(error),
        };

        let id = *id;
        self.tracker.finish(&self.state, result, |state, _| {
            self.replay.apply(state, move |state| {
                state.reminders.retain(|reminder| reminder.id != id);
            });
        })
    }

    pub async fn delete_reminder(&self, id: &ReminderId) -> Result<()> {
        let _ticket = self.tracker.begin(&self.state);
        let result = match require_user(&self.session).await {
            Ok(_) => {
                self.cancel_cached_handle(id).await;
                self.gateway.delete_reminder(id).await
            }
            Err(error) => Err(error),
        };

        let id = *id;
        self.tracker.finish(&self.state, result, |state, _| {
            self.replay.apply(state, move |state| {
                state.reminders.retain(|reminder| reminder.id != id);
            });
        })
    }

    /// Push a reminder `minutes` into the future and reschedule its notification.
    pub async fn snooze_reminder(&self, id: &ReminderId, minutes: i64) -> Result<Reminder> {
        let _ticket = self.tracker.begin(&self.state);
        let result = self.snooze(id, minutes).await;

        self.tracker.finish(&self.state, result, |state, snoozed| {
            let snoozed = snoozed.clone();
            self.replay.apply(state, move |state| {
                if let Some(cached) = state.reminders.iter_mut().find(|r| r.id == snoozed.id) {
                    *cached = snoozed.clone();
                }
                state.reminders.sort_by_key(|reminder| reminder.remind_at);
            });
        })
    }

    async fn snooze(&self, id: &ReminderId, minutes: i64) -> Result<Reminder> {
        if minutes <= 0 {
            return Err(Error::InvalidInput(
                "Snooze duration must be positive".to_string(),
            ));
        }
        let remind_at = TimeDelta::try_minutes(minutes)
            .and_then(|delay| Utc::now().checked_add_signed(delay))
            .ok_or_else(|| Error::InvalidInput("Snooze duration is too long".to_string()))?;
        require_user(&self.session).await?;
        let mut reminder = self
            .reminder(id)
            .ok_or_else(|| Error::NotFound("Reminder".to_string()))?;

        if let Some(handle) = &reminder.notification_id {
            self.scheduler.cancel(handle).await;
        }

        reminder.remind_at = remind_at;
        let handle = self.schedule_for(&reminder).await;
        let patch = ReminderPatch::snoozed(reminder.remind_at, handle.clone());

        if let Err(error) = self.gateway.update_reminder(id, &patch).await {
            if let Some(handle) = &handle {
                self.scheduler.cancel(handle).await;
            }
            if reminder.notification_id.is_some() {
                tracing::warn!(
                    reminder_id = %id,
                    "Snooze failed after cancelling the pending notification; reminder has no live notification"
                );
            }
            return Err(error);
        }

        patch.apply_to(&mut reminder);
        tracing::info!(reminder_id = %id, minutes, "Snoozed reminder");
        Ok(reminder)
    }

    async fn schedule_for(&self, reminder: &Reminder) -> Option<NotificationHandle> {
        match self
            .scheduler
            .schedule(&NotificationRequest::for_reminder(reminder))
            .await
        {
            Ok(handle) => Some(handle),
            Err(error) => {
                tracing::warn!(
                    reminder_id = %reminder.id,
                    "Failed to schedule notification: {}",
                    error
                );
                None
            }
        }
    }

    async fn cancel_cached_handle(&self, id: &ReminderId) {
        let handle = self
            .reminder(id)
            .and_then(|reminder| reminder.notification_id);
        if let Some(handle) = handle {
            self.scheduler.cancel(&handle).await;
        }
    }
}

fn insert_sorted(reminders: &mut Vec<Reminder>, reminder: Reminder) {
    let index = reminders.partition_point(|existing| existing.remind_at <= reminder.remind_at);
    reminders.insert(index, reminder);
}
