//! Local notification scheduling for reminders.
//!
//! Two implementations sit behind [`NotificationScheduler`]: a platform one
//! that hands notifications to the OS, and a deferred one that keeps tokio
//! timers inside the running process. [`select_scheduler`] picks one at
//! startup.

mod deferred;
mod platform;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{NoteId, NotificationHandle, Priority, Reminder, ReminderId};
use crate::Result;

pub use deferred::{DeferredScheduler, LogSink, NotificationSink};
pub use platform::{
    ChannelSpec, PermissionState, PlatformContent, PlatformNotifications, PlatformScheduler,
    CHANNELS,
};

pub const REMINDERS_CHANNEL: &str = "reminders";
pub const HIGH_PRIORITY_CHANNEL: &str = "high-priority";

/// Payload attached to every reminder notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub reminder_id: ReminderId,
    pub note_id: Option<NoteId>,
    pub priority: Priority,
}

/// Where tapping a notification should lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationRoute {
    Note(NoteId),
    Reminders,
}

impl NotificationData {
    #[must_use]
    pub fn route(&self) -> NotificationRoute {
        self.note_id
            .map_or(NotificationRoute::Reminders, NotificationRoute::Note)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<Utc>,
    pub data: NotificationData,
}

impl NotificationRequest {
    #[must_use]
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            title: reminder.title.clone(),
            body: reminder.notification_body(),
            trigger_at: reminder.remind_at,
            data: NotificationData {
                reminder_id: reminder.id,
                note_id: reminder.note_id,
                priority: reminder.priority,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Default,
    High,
    Max,
}

/// Presentation derived from a reminder's priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelProfile {
    pub channel_id: &'static str,
    pub sound: bool,
    pub urgency: Urgency,
    pub accent_color: &'static str,
    /// Keep the notification on screen until dismissed.
    pub sticky: bool,
}

impl ChannelProfile {
    #[must_use]
    pub const fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::High => Self {
                channel_id: HIGH_PRIORITY_CHANNEL,
                sound: true,
                urgency: Urgency::Max,
                accent_color: "#DC2626",
                sticky: true,
            },
            Priority::Medium => Self {
                channel_id: REMINDERS_CHANNEL,
                sound: true,
                urgency: Urgency::Default,
                accent_color: "#2563EB",
                sticky: false,
            },
            Priority::Low => Self {
                channel_id: REMINDERS_CHANNEL,
                sound: false,
                urgency: Urgency::Low,
                accent_color: "#2563EB",
                sticky: false,
            },
        }
    }
}

/// Schedules and cancels one-shot reminder notifications.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Ask for permission to show notifications. Returns whether it is granted.
    async fn request_permission(&self) -> Result<bool>;

    /// Schedule `request` and return a handle that can cancel it.
    async fn schedule(&self, request: &NotificationRequest) -> Result<NotificationHandle>;

    /// Cancel a scheduled notification. Unknown or already fired handles are
    /// ignored and failures are only logged.
    async fn cancel(&self, handle: &NotificationHandle);

    /// Cancel everything this scheduler has pending.
    async fn cancel_all(&self);

    /// Drop process-local resources such as pending timers.
    async fn release(&self) {}
}

/// Where the process is running, as far as notifications are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// An OS notification service is available.
    Native,
    /// Notifications only fire while this process is alive.
    Deferred,
}

impl RuntimeEnvironment {
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Self::Native
        } else {
            Self::Deferred
        }
    }
}

/// Build the scheduler for `environment`.
///
/// Falls back to the deferred scheduler when a native environment has no
/// backend to talk to.
///
/// This crate ships no [`PlatformNotifications`] implementation. An embedding
/// app supplies one for the OS it runs on. The CLI always passes `None`, so it
/// uses deferred timers.
pub fn select_scheduler(
    environment: RuntimeEnvironment,
    backend: Option<Arc<dyn PlatformNotifications>>,
    sink: Arc<dyn NotificationSink>,
) -> Arc<dyn NotificationScheduler> {
    match (environment, backend) {
        (RuntimeEnvironment::Native, Some(backend)) => {
            tracing::info!("Using platform notification scheduler");
            Arc::new(PlatformScheduler::new(backend))
        }
        (RuntimeEnvironment::Native, None) => {
            tracing::warn!("No platform notification backend; using in-process timers");
            Arc::new(DeferredScheduler::new(sink))
        }
        (RuntimeEnvironment::Deferred, _) => {
            tracing::info!("Using in-process notification timers");
            Arc::new(DeferredScheduler::new(sink))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_maps_to_channel_profile() {
        let high = ChannelProfile::for_priority(Priority::High);
        assert_eq!(high.channel_id, HIGH_PRIORITY_CHANNEL);
        assert!(high.sound);
        assert_eq!(high.urgency, Urgency::Max);
        assert_eq!(high.accent_color, "#DC2626");

        let medium = ChannelProfile::for_priority(Priority::Medium);
        assert_eq!(medium.channel_id, REMINDERS_CHANNEL);
        assert!(medium.sound);
        assert_eq!(medium.urgency, Urgency::Default);

        let low = ChannelProfile::for_priority(Priority::Low);
        assert_eq!(low.channel_id, REMINDERS_CHANNEL);
        assert!(!low.sound);
        assert_eq!(low.urgency, Urgency::Low);
    }

    #[test]
    fn route_prefers_linked_note() {
        let note_id = NoteId::new();
        let mut data = NotificationData {
            reminder_id: ReminderId::new(),
            note_id: Some(note_id),
            priority: Priority::Medium,
        };
        assert_eq!(data.route(), NotificationRoute::Note(note_id));
        data.note_id = None;
        assert_eq!(data.route(), NotificationRoute::Reminders);
    }

    #[test]
    fn desktop_targets_use_deferred_timers() {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            return;
        }
        assert_eq!(RuntimeEnvironment::detect(), RuntimeEnvironment::Deferred);
    }
}
