//! Application-wide service container.

use std::sync::Arc;

use crate::auth::SessionSource;
use crate::gateway::RemoteGateway;
use crate::notify::NotificationScheduler;
use crate::store::{NotesStore, ReminderStore};

/// Owns one notes store and one reminder store sharing a gateway, session
/// and notification scheduler. Front ends build it once at startup.
pub struct AppContext {
    notes: NotesStore,
    reminders: ReminderStore,
    gateway: Arc<dyn RemoteGateway>,
    scheduler: Arc<dyn NotificationScheduler>,
}

impl AppContext {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        session: Arc<dyn SessionSource>,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        Self {
            notes: NotesStore::new(Arc::clone(&gateway), Arc::clone(&session)),
            reminders: ReminderStore::new(
                Arc::clone(&gateway),
                session,
                Arc::clone(&scheduler),
            ),
            gateway,
            scheduler,
        }
    }

    #[must_use]
    pub const fn notes(&self) -> &NotesStore {
        &self.notes
    }

    #[must_use]
    pub const fn reminders(&self) -> &ReminderStore {
        &self.reminders
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn RemoteGateway> {
        &self.gateway
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn NotificationScheduler> {
        &self.scheduler
    }

    /// Clear cached data and drop process-local notification timers.
    pub async fn dispose(&self) {
        self.notes.reset();
        self.reminders.reset();
        self.scheduler.release().await;
        tracing::debug!("Application context disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewNote, NewReminder, NoteType};
    use crate::store::test_support::{gateway, signed_in, FakeScheduler};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn dispose_clears_caches_and_releases_timers() {
        let scheduler = Arc::new(FakeScheduler::default());
        let context = AppContext::new(gateway(), signed_in(), scheduler.clone());

        context
            .notes()
            .create_note(NewNote::new(NoteType::Text, "", "t", "c", "s", vec![]))
            .await
            .unwrap();
        context
            .reminders()
            .create_reminder(NewReminder::new("r", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();

        context.dispose().await;

        assert!(context.notes().snapshot().notes.is_empty());
        assert!(context.reminders().snapshot().reminders.is_empty());
        assert!(scheduler.released());
    }
}
