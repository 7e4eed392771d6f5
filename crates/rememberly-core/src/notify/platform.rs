//! Scheduler backed by an OS notification service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use super::{
    ChannelProfile, NotificationData, NotificationRequest, NotificationScheduler, Urgency,
    HIGH_PRIORITY_CHANNEL, REMINDERS_CHANNEL,
};
use crate::error::{Error, Result};
use crate::models::NotificationHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

/// A notification channel the OS must know about before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub urgency: Urgency,
}

pub const CHANNELS: [ChannelSpec; 2] = [
    ChannelSpec {
        id: REMINDERS_CHANNEL,
        name: "Reminders",
        urgency: Urgency::High,
    },
    ChannelSpec {
        id: HIGH_PRIORITY_CHANNEL,
        name: "High Priority Reminders",
        urgency: Urgency::Max,
    },
];

/// Content handed to the OS for a one-shot notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContent {
    pub title: String,
    pub body: String,
    pub data: NotificationData,
    pub profile: ChannelProfile,
}

/// Thin binding over the host's notification API.
#[async_trait]
pub trait PlatformNotifications: Send + Sync {
    async fn permission_status(&self) -> Result<PermissionState>;
    async fn request_permission(&self) -> Result<PermissionState>;
    async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<()>;
    /// Schedule `content` at `trigger_at`, returning the OS identifier.
    async fn schedule(&self, content: &PlatformContent, trigger_at: DateTime<Utc>)
        -> Result<String>;
    async fn cancel(&self, id: &str) -> Result<()>;
    async fn cancel_all(&self) -> Result<()>;
}

pub struct PlatformScheduler {
    backend: Arc<dyn PlatformNotifications>,
    channels: OnceCell<()>,
}

impl PlatformScheduler {
    pub fn new(backend: Arc<dyn PlatformNotifications>) -> Self {
        Self {
            backend,
            channels: OnceCell::new(),
        }
    }

    async fn ensure_channels(&self) -> Result<()> {
        self.channels
            .get_or_try_init(|| async {
                for channel in &CHANNELS {
                    self.backend.ensure_channel(channel).await?;
                }
                tracing::debug!("Registered notification channels");
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationScheduler for PlatformScheduler {
    async fn request_permission(&self) -> Result<bool> {
        self.ensure_channels().await?;
        if self.backend.permission_status().await? == PermissionState::Granted {
            return Ok(true);
        }
        Ok(self.backend.request_permission().await? == PermissionState::Granted)
    }

    async fn schedule(&self, request: &NotificationRequest) -> Result<NotificationHandle> {
        if !self.request_permission().await? {
            return Err(Error::Notification(
                "Permission not granted for notifications".to_string(),
            ));
        }

        let content = PlatformContent {
            title: request.title.clone(),
            body: request.body.clone(),
            data: request.data.clone(),
            profile: ChannelProfile::for_priority(request.data.priority),
        };
        let id = self.backend.schedule(&content, request.trigger_at).await?;
        tracing::debug!(notification_id = %id, "Scheduled platform notification");
        Ok(NotificationHandle::new(id))
    }

    async fn cancel(&self, handle: &NotificationHandle) {
        if let Err(error) = self.backend.cancel(handle.as_str()).await {
            tracing::warn!("Failed to cancel notification {}: {}", handle, error);
        }
    }

    async fn cancel_all(&self) {
        if let Err(error) = self.backend.cancel_all().await {
            tracing::warn!("Failed to cancel all notifications: {}", error);
        }
    }
}
