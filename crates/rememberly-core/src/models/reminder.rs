//! Reminder model

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NoteId;
use crate::error::Error;
use crate::util::normalize_text_option;

/// Snooze choices offered for a due reminder, in minutes.
pub const SNOOZE_PRESETS_MINUTES: [i64; 3] = [15, 60, 24 * 60];

/// A unique identifier for a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderId(Uuid);

impl ReminderId {
    /// Create a new unique reminder ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ReminderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReminderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Opaque identifier of a scheduled platform notification.
///
/// Only ever used to cancel the notification it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reminder urgency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// A reminder row as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub user_id: String,
    #[serde(default)]
    pub note_id: Option<NoteId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub remind_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notification_id: Option<NotificationHandle>,
    #[serde(default)]
    pub natural_input: String,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.remind_at < now
    }

    /// Body text used for the reminder's notification.
    #[must_use]
    pub fn notification_body(&self) -> String {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .unwrap_or("Reminder notification")
            .to_string()
    }
}

/// Form input for a reminder that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub title: String,
    pub description: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub priority: Priority,
    pub note_id: Option<NoteId>,
}

impl NewReminder {
    pub fn new(title: impl Into<String>, remind_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            remind_at,
            priority: Priority::default(),
            note_id: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn with_note(mut self, note_id: NoteId) -> Self {
        self.note_id = Some(note_id);
        self
    }

    /// Reject blank titles and reminder times that are not in the future.
    pub fn validate(&self, now: DateTime<Utc>) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Please enter a reminder title".to_string(),
            ));
        }
        if self.remind_at <= now {
            return Err(Error::InvalidInput(
                "Please select a future date and time".to_string(),
            ));
        }
        Ok(())
    }
}

/// Insert payload for the `reminders` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderInsert {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub priority: Priority,
    pub natural_input: String,
    pub note_id: Option<NoteId>,
    pub is_completed: bool,
}

impl ReminderInsert {
    pub fn from_new(user_id: impl Into<String>, reminder: &NewReminder) -> Self {
        let title = reminder.title.trim().to_string();
        Self {
            user_id: user_id.into(),
            natural_input: natural_input(&title, reminder.remind_at),
            title,
            description: normalize_text_option(reminder.description.clone()),
            remind_at: reminder.remind_at,
            priority: reminder.priority,
            note_id: reminder.note_id,
            is_completed: false,
        }
    }
}

/// Partial update for a reminder.
///
/// `notification_id` is tri-state: `None` leaves the column alone,
/// `Some(None)` writes null, `Some(Some(handle))` stores the handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<Option<NotificationHandle>>,
}

impl ReminderPatch {
    #[must_use]
    pub fn notification(handle: Option<NotificationHandle>) -> Self {
        Self {
            notification_id: Some(handle),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn completed() -> Self {
        Self {
            is_completed: Some(true),
            notification_id: Some(None),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn snoozed(remind_at: DateTime<Utc>, handle: Option<NotificationHandle>) -> Self {
        Self {
            remind_at: Some(remind_at),
            notification_id: Some(handle),
            ..Self::default()
        }
    }

    /// Merge this patch into a cached reminder.
    pub fn apply_to(&self, reminder: &mut Reminder) {
        if let Some(remind_at) = self.remind_at {
            reminder.remind_at = remind_at;
        }
        if let Some(is_completed) = self.is_completed {
            reminder.is_completed = is_completed;
        }
        if let Some(handle) = &self.notification_id {
            reminder.notification_id.clone_from(handle);
        }
    }
}

/// Human-readable description stored alongside a new reminder.
pub fn natural_input(title: &str, remind_at: DateTime<Utc>) -> String {
    let local = remind_at.with_timezone(&Local);
    format!(
        "Remind me about \"{title}\" on {}",
        local.format("%-m/%-d/%Y, %-I:%M:%S %p")
    )
}

/// Split reminders into overdue and upcoming, preserving order.
pub fn partition_due(reminders: &[Reminder], now: DateTime<Utc>) -> (Vec<Reminder>, Vec<Reminder>) {
    reminders
        .iter()
        .cloned()
        .partition(|reminder| reminder.is_overdue(now))
}

/// Relative label for a reminder time, e.g. `in 5 minutes` or `2 hours ago`.
pub fn format_reminder_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = (at - now).num_milliseconds();
    let minutes = diff_ms.div_euclid(60_000);
    let hours = diff_ms.div_euclid(3_600_000);
    let days = diff_ms.div_euclid(86_400_000);

    if diff_ms < 0 {
        let (minutes, hours, days) = (minutes.abs(), hours.abs(), days.abs());
        return if minutes < 60 {
            format!("{minutes} {} ago", plural(minutes, "minute"))
        } else if hours < 24 {
            format!("{hours} {} ago", plural(hours, "hour"))
        } else {
            format!("{days} {} ago", plural(days, "day"))
        };
    }

    if minutes < 60 {
        format!("in {minutes} {}", plural(minutes, "minute"))
    } else if hours < 24 {
        format!("in {hours} {}", plural(hours, "hour"))
    } else if days < 7 {
        format!("in {days} {}", plural(days, "day"))
    } else {
        at.with_timezone(&Local)
            .format("%a, %b %-d, %-I:%M %p")
            .to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

/// Parse a reminder time typed by the user. Only future times are accepted.
///
/// Understands RFC 3339, `YYYY-MM-DD HH:MM` in local time, `tomorrow`, and
/// relative offsets such as `in 30 minutes`, `2h` or `1 day`.
pub fn parse_reminder_time(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let parsed = parse_absolute(input).or_else(|| parse_relative(&input.to_lowercase(), now));
    parsed.filter(|at| *at > now)
}

fn parse_absolute(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
}

fn parse_relative(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if input == "tomorrow" {
        return Some(now + Duration::days(1));
    }

    static RELATIVE: OnceLock<Regex> = OnceLock::new();
    let re = RELATIVE.get_or_init(|| {
        Regex::new(r"^(?:in\s+)?(\d{1,6})\s*(m|mins?|minutes?|h|hrs?|hours?|d|days?|w|weeks?)$")
            .expect("Invalid regex")
    });

    let captures = re.captures(input)?;
    let amount: i64 = captures[1].parse().ok()?;
    let offset = match captures[2].chars().next()? {
        'm' => Duration::minutes(amount),
        'h' => Duration::hours(amount),
        'd' => Duration::days(amount),
        'w' => Duration::weeks(amount),
        _ => return None,
    };
    Some(now + offset)
}
