use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rememberly_core::models::{
    format_reminder_time, parse_reminder_time, NewReminder, NotificationHandle, Priority,
};
use rememberly_core::notify::{NotificationRequest, NotificationScheduler, RuntimeEnvironment};
use rememberly_core::{Reminder, ReminderId};

use crate::commands::common::{
    format_reminder_lines, normalize_content, normalize_identifier, open_workspace, resolve_note,
    resolve_reminder, reminder_to_list_item, ReminderListItem, Workspace,
};
use crate::error::CliError;

const WATCH_REFRESH_SECS: u64 = 60;

pub struct NewReminderArgs {
    pub title: Vec<String>,
    pub at: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub note: Option<String>,
}

pub async fn run_list(as_json: bool, profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let store = workspace.context.reminders();
    store.fetch_reminders().await?;

    let now = Utc::now();
    let (overdue, upcoming) = store.overdue_and_upcoming(now);

    if as_json {
        let items = overdue
            .iter()
            .chain(upcoming.iter())
            .map(|reminder| reminder_to_list_item(reminder, now))
            .collect::<Vec<ReminderListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if overdue.is_empty() && upcoming.is_empty() {
        println!("No active reminders");
        return Ok(());
    }
    if !overdue.is_empty() {
        println!("Overdue");
        for line in format_reminder_lines(&overdue, now) {
            println!("  {line}");
        }
    }
    if !upcoming.is_empty() {
        println!("Upcoming");
        for line in format_reminder_lines(&upcoming, now) {
            println!("  {line}");
        }
    }
    Ok(())
}

pub async fn run_add(args: NewReminderArgs, profile: Option<&str>) -> Result<(), CliError> {
    let title = normalize_content(&args.title.join(" ")).ok_or(CliError::EmptyContent)?;
    let now = Utc::now();
    let remind_at = parse_reminder_time(&args.at, now)
        .ok_or_else(|| CliError::InvalidReminderTime(args.at.clone()))?;

    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let mut new_reminder = NewReminder::new(title, remind_at).with_priority(args.priority);
    if let Some(description) = args.description.as_deref().and_then(normalize_content) {
        new_reminder = new_reminder.with_description(description);
    }
    if let Some(note_query) = args.note.as_deref() {
        let notes = workspace.context.notes().fetch_notes().await?;
        let note = resolve_note(&normalize_identifier(note_query)?, &notes)?;
        new_reminder = new_reminder.with_note(note.id);
    }

    let reminder = workspace
        .context
        .reminders()
        .create_reminder(new_reminder)
        .await?;

    println!("{}", reminder.id);
    eprintln!(
        "Reminder \"{}\" set {}",
        reminder.title,
        format_reminder_time(reminder.remind_at, Utc::now())
    );
    if reminder.notification_id.is_none() {
        eprintln!("Notification could not be scheduled; the reminder was still saved.");
    } else if RuntimeEnvironment::detect() == RuntimeEnvironment::Deferred {
        eprintln!("Run `rememberly reminders watch` to be notified when it is due.");
    }
    Ok(())
}

pub async fn run_done(id: &str, profile: Option<&str>) -> Result<(), CliError> {
    let (workspace, reminder) = load_reminder(id, profile).await?;
    workspace
        .context
        .reminders()
        .complete_reminder(&reminder.id)
        .await?;
    println!("{}", reminder.id);
    Ok(())
}

pub async fn run_delete(id: &str, profile: Option<&str>) -> Result<(), CliError> {
    let (workspace, reminder) = load_reminder(id, profile).await?;
    workspace
        .context
        .reminders()
        .delete_reminder(&reminder.id)
        .await?;
    println!("{}", reminder.id);
    Ok(())
}

pub async fn run_snooze(id: &str, minutes: i64, profile: Option<&str>) -> Result<(), CliError> {
    let (workspace, reminder) = load_reminder(id, profile).await?;
    let snoozed = workspace
        .context
        .reminders()
        .snooze_reminder(&reminder.id, minutes)
        .await?;
    println!("{}", snoozed.id);
    eprintln!(
        "Snoozed \"{}\" until {}",
        snoozed.title,
        format_reminder_time(snoozed.remind_at, Utc::now())
    );
    Ok(())
}

async fn load_reminder(
    id: &str,
    profile: Option<&str>,
) -> Result<(Workspace, Reminder), CliError> {
    let normalized_id = normalize_identifier(id)?;
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let reminders = workspace.context.reminders().fetch_reminders().await?;
    let reminder = resolve_reminder(&normalized_id, &reminders)?.clone();
    Ok((workspace, reminder))
}

/// Keep in-process timers for every active reminder until Ctrl-C.
pub async fn run_watch(profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let scheduler = Arc::clone(workspace.context.scheduler());
    let mut armed = ArmedReminders::default();
    let mut refresh = tokio::time::interval(Duration::from_secs(WATCH_REFRESH_SECS));

    println!(
        "Watching reminders for profile '{}'. Press Ctrl-C to stop.",
        workspace.profile_name
    );

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                match workspace.context.reminders().fetch_reminders().await {
                    Ok(reminders) => {
                        let changed = armed.sync(scheduler.as_ref(), &reminders).await;
                        if changed > 0 {
                            tracing::info!("Armed {} reminder timers", changed);
                        }
                    }
                    Err(error) => {
                        tracing::warn!("Could not refresh reminders: {}", error.user_message());
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    workspace.context.dispose().await;
    println!("Stopped watching");
    Ok(())
}

/// Timers armed by `watch`, keyed by reminder.
#[derive(Debug, Default)]
pub struct ArmedReminders {
    timers: HashMap<ReminderId, (NotificationHandle, DateTime<Utc>)>,
}

impl ArmedReminders {
    /// Match timers to `reminders`: cancel timers of reminders that are gone
    /// or moved, arm the missing ones. Returns how many timers were armed.
    pub async fn sync(
        &mut self,
        scheduler: &dyn NotificationScheduler,
        reminders: &[Reminder],
    ) -> usize {
        let stale = self
            .timers
            .iter()
            .filter(|(id, (_, at))| {
                !reminders
                    .iter()
                    .any(|reminder| reminder.id == **id && reminder.remind_at == *at)
            })
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for id in stale {
            if let Some((handle, _)) = self.timers.remove(&id) {
                scheduler.cancel(&handle).await;
            }
        }

        let mut armed = 0;
        for reminder in reminders {
            if self.timers.contains_key(&reminder.id) {
                continue;
            }
            match scheduler
                .schedule(&NotificationRequest::for_reminder(reminder))
                .await
            {
                Ok(handle) => {
                    self.timers
                        .insert(reminder.id, (handle, reminder.remind_at));
                    armed += 1;
                }
                Err(error) => {
                    tracing::warn!("Could not arm reminder {}: {}", reminder.id, error);
                }
            }
        }
        armed
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
