use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rememberly_core::config::ClientConfig;
use rememberly_core::gateway::PostgrestGateway;
use rememberly_core::models::format_reminder_time;
use rememberly_core::notify::{
    select_scheduler, NotificationRequest, NotificationSink, RuntimeEnvironment,
};
use rememberly_core::summarize::{HeuristicSummarizer, HttpSummarizer, Summarizer};
use rememberly_core::util::truncate_with_ellipsis;
use rememberly_core::{AppContext, Note, Reminder};
use serde::Serialize;

use crate::auth::{AuthService, AuthSession};
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

/// Everything a command needs to talk to the backend for one profile.
pub struct Workspace {
    pub profile_name: String,
    pub config: ClientConfig,
    pub auth: AuthService,
    pub context: AppContext,
}

impl Workspace {
    /// The restored session, or [`CliError::NotSignedIn`].
    pub async fn require_session(&self) -> Result<AuthSession, CliError> {
        self.auth
            .restore_session()
            .await
            .map_err(|error| CliError::Auth(error.to_string()))?
            .ok_or_else(|| CliError::NotSignedIn(self.profile_name.clone()))
    }

    /// Summarizer endpoint from config, or the offline heuristic.
    pub fn summarizer(&self) -> Result<Arc<dyn Summarizer>, CliError> {
        summarizer_for(&self.config)
    }
}

pub fn summarizer_for(config: &ClientConfig) -> Result<Arc<dyn Summarizer>, CliError> {
    match config.summarizer_url.as_deref() {
        Some(url) => Ok(Arc::new(HttpSummarizer::new(url)?)),
        None => {
            tracing::debug!("No summarizer endpoint configured; using heuristic summaries");
            Ok(Arc::new(HeuristicSummarizer))
        }
    }
}

pub fn load_profile(global_profile: Option<&str>) -> Result<(String, CliProfile), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    Ok((profile_name, profile))
}

pub fn open_workspace(global_profile: Option<&str>) -> Result<Workspace, CliError> {
    let (profile_name, profile) = load_profile(global_profile)?;
    let config = profile.client_config()?;
    let auth = AuthService::new(&profile_name, &config)
        .map_err(|error| CliError::Auth(error.to_string()))?;

    let session = auth.session_source();
    let gateway = Arc::new(PostgrestGateway::new(&config, Arc::clone(&session))?);
    let scheduler = select_scheduler(RuntimeEnvironment::detect(), None, Arc::new(TerminalSink));
    tracing::debug!(profile = %profile_name, "Opened workspace");

    Ok(Workspace {
        profile_name,
        config,
        auth,
        context: AppContext::new(gateway, session, scheduler),
    })
}

/// Prints due reminders to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

#[async_trait]
impl NotificationSink for TerminalSink {
    async fn deliver(&self, notification: &NotificationRequest) {
        tracing::info!(reminder_id = %notification.data.reminder_id, "Reminder due");
        println!(
            "\u{7}[{}] {}: {}",
            notification.data.priority, notification.title, notification.body
        );
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub file_url: Option<String>,
    pub created_at: String,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct ReminderListItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub remind_at: String,
    pub due: String,
    pub priority: String,
    pub overdue: bool,
    pub note_id: Option<String>,
}

/// Find the single item whose id equals or starts with `query`.
fn resolve_by_prefix<'a, T>(
    query: &str,
    items: &'a [T],
    id_of: impl Fn(&T) -> String,
    not_found: impl FnOnce(String) -> CliError,
) -> Result<&'a T, CliError> {
    let query_lower = query.to_lowercase();
    if let Some(exact) = items.iter().find(|item| id_of(*item) == query_lower) {
        return Ok(exact);
    }

    let matching = items
        .iter()
        .filter(|item| id_of(*item).starts_with(&query_lower))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(not_found(query.to_string())),
        [single] => Ok(*single),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|item| short_id(&id_of(*item)))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn resolve_note<'a>(query: &str, notes: &'a [Note]) -> Result<&'a Note, CliError> {
    resolve_by_prefix(
        query,
        notes,
        |note| note.id.to_string(),
        CliError::NoteNotFound,
    )
}

pub fn resolve_reminder<'a>(
    query: &str,
    reminders: &'a [Reminder],
) -> Result<&'a Reminder, CliError> {
    resolve_by_prefix(
        query,
        reminders,
        |reminder| reminder.id.to_string(),
        CliError::ReminderNotFound,
    )
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn format_note_lines(notes: &[Note], now: DateTime<Utc>) -> Vec<String> {
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id.to_string());
            let preview = preview(&note.title, 40);
            let relative_time = format_relative_time(note.created_at, now);
            let tags = render_tags(&note.tags);

            if tags.is_empty() {
                format!(
                    "{short_id:<13}  {:<5}  {preview:<40}  {relative_time}",
                    note.kind.as_str()
                )
            } else {
                format!(
                    "{short_id:<13}  {:<5}  {preview:<40}  {relative_time:<10}  {tags}",
                    note.kind.as_str()
                )
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note, now: DateTime<Utc>) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        kind: note.kind.to_string(),
        summary: note.summary.clone(),
        tags: note.tags.clone(),
        source_url: note.source_url.clone(),
        file_url: note.file_url.clone(),
        created_at: note.created_at.to_rfc3339(),
        relative_time: format_relative_time(note.created_at, now),
    }
}

pub fn format_reminder_lines(reminders: &[Reminder], now: DateTime<Utc>) -> Vec<String> {
    reminders
        .iter()
        .map(|reminder| {
            let short_id = short_id(&reminder.id.to_string());
            let title = preview(&reminder.title, 40);
            let due = format_reminder_time(reminder.remind_at, now);
            format!(
                "{short_id:<13}  {:<6}  {title:<40}  {due}",
                reminder.priority.as_str()
            )
        })
        .collect()
}

pub fn reminder_to_list_item(reminder: &Reminder, now: DateTime<Utc>) -> ReminderListItem {
    ReminderListItem {
        id: reminder.id.to_string(),
        title: reminder.title.clone(),
        description: reminder.description.clone(),
        remind_at: reminder.remind_at.to_rfc3339(),
        due: format_reminder_time(reminder.remind_at, now),
        priority: reminder.priority.to_string(),
        overdue: reminder.is_overdue(now),
        note_id: reminder.note_id.as_ref().map(ToString::to_string),
    }
}

/// First line of `text` with whitespace collapsed, cut to `max_chars`.
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        truncate_with_ellipsis(&collapsed, max_chars.saturating_sub(3))
    }
}

pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Trim tags, drop empties and repeats, keep the given order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').to_string();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - at).num_milliseconds();
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Text for a new note from args, then piped stdin, then `$EDITOR`.
pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial("")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(CliError::EditorFailed("empty EDITOR command".into()));
    };

    let status = Command::new(program).args(parts).arg(file_path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("rememberly-note-{}-{now}.md", std::process::id()))
}
