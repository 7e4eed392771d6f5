use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use rememberly_core::error::OFFLINE_MESSAGE;
use rememberly_core::models::{NotificationHandle, Priority};
use rememberly_core::notify::{NotificationRequest, NotificationScheduler};
use rememberly_core::search::NoteSort;
use rememberly_core::{Note, NoteId, NoteType, Reminder, ReminderId};

use crate::cli::{Cli, Commands, ReminderCommands};
use crate::commands::common::{
    default_editor, format_note_lines, format_relative_time, format_reminder_lines,
    normalize_content, normalize_identifier, normalize_tags, preview, resolve_note,
    resolve_reminder,
};
use crate::commands::config::{mask_secret, merge_profile, InitValues};
use crate::commands::edit::build_patch;
use crate::commands::list::{select_notes, ListOptions};
use crate::commands::reminders::ArmedReminders;
use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

fn note(id: &str, title: &str, tags: &[&str], age_minutes: i64) -> Note {
    let created_at = Utc::now() - Duration::minutes(age_minutes);
    Note {
        id: id.parse::<NoteId>().unwrap(),
        user_id: "user-1".to_string(),
        title: title.to_string(),
        original_content: format!("{title} body"),
        summary: String::new(),
        kind: NoteType::Text,
        tags: tags.iter().map(ToString::to_string).collect(),
        source_url: None,
        file_url: None,
        created_at,
        updated_at: created_at,
    }
}

fn reminder(id: &str, title: &str, remind_at: chrono::DateTime<Utc>) -> Reminder {
    Reminder {
        id: id.parse::<ReminderId>().unwrap(),
        user_id: "user-1".to_string(),
        note_id: None,
        title: title.to_string(),
        description: None,
        remind_at,
        priority: Priority::High,
        is_completed: false,
        notification_id: None,
        natural_input: String::new(),
        created_at: Utc::now(),
    }
}

const FIRST: &str = "0190a000-0000-7000-8000-000000000001";
const SECOND: &str = "0190a000-0000-7000-8000-000000000002";
const OTHER: &str = "02b4c000-0000-7000-8000-000000000003";

#[test]
fn parses_list_filters() {
    let cli = Cli::try_parse_from([
        "rememberly", "list", "--type", "url", "--sort", "title", "-c", "news", "--json",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::List {
            kind,
            sort,
            category,
            json,
            limit,
            query,
        }) => {
            assert_eq!(kind, Some(NoteType::Url));
            assert_eq!(sort, NoteSort::Title);
            assert_eq!(category.as_deref(), Some("news"));
            assert!(json);
            assert_eq!(limit, 20);
            assert_eq!(query, None);
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn rejects_unknown_note_type() {
    assert!(Cli::try_parse_from(["rememberly", "add", "--type", "video", "clip"]).is_err());
}

#[test]
fn parses_reminder_add_with_global_profile() {
    let cli = Cli::try_parse_from([
        "rememberly",
        "reminders",
        "add",
        "Call",
        "mom",
        "--at",
        "in 2 hours",
        "--priority",
        "high",
        "--profile",
        "work",
    ])
    .unwrap();

    assert_eq!(cli.profile.as_deref(), Some("work"));
    match cli.command {
        Some(Commands::Reminders(ReminderCommands::Add {
            title,
            at,
            priority,
            note,
            ..
        })) => {
            assert_eq!(title, vec!["Call".to_string(), "mom".to_string()]);
            assert_eq!(at, "in 2 hours");
            assert_eq!(priority, Priority::High);
            assert_eq!(note, None);
        }
        _ => panic!("expected reminders add command"),
    }
}

#[test]
fn snooze_defaults_to_fifteen_minutes() {
    let cli = Cli::try_parse_from(["rememberly", "reminders", "snooze", "0190"]).unwrap();
    match cli.command {
        Some(Commands::Reminders(ReminderCommands::Snooze { id, minutes })) => {
            assert_eq!(id, "0190");
            assert_eq!(minutes, 15);
        }
        _ => panic!("expected snooze command"),
    }
}

#[test]
fn snooze_rejects_non_positive_minutes() {
    for minutes in ["0", "-5"] {
        let parsed = Cli::try_parse_from([
            "rememberly",
            "reminders",
            "snooze",
            "0190",
            "--minutes",
            minutes,
        ]);
        assert!(parsed.is_err(), "{minutes} should be rejected");
    }
}

#[test]
fn edit_tags_split_on_commas() {
    let cli = Cli::try_parse_from(["rememberly", "edit", "0190", "--tags", "work,ideas"]).unwrap();
    match cli.command {
        Some(Commands::Edit { tags, title, .. }) => {
            assert_eq!(tags, Some(vec!["work".to_string(), "ideas".to_string()]));
            assert_eq!(title, None);
        }
        _ => panic!("expected edit command"),
    }
}

#[test]
fn bare_words_are_quick_capture() {
    let cli = Cli::try_parse_from(["rememberly", "buy", "milk"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.note, vec!["buy".to_string(), "milk".to_string()]);
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn normalize_identifier_rejects_blank() {
    assert!(matches!(normalize_identifier("  "), Err(CliError::EmptyId)));
    assert_eq!(normalize_identifier(" 0190 ").unwrap(), "0190");
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn resolve_note_by_exact_id_and_unique_prefix() {
    let notes = vec![
        note(FIRST, "first", &[], 1),
        note(SECOND, "second", &[], 2),
        note(OTHER, "other", &[], 3),
    ];

    assert_eq!(resolve_note(SECOND, &notes).unwrap().title, "second");
    assert_eq!(resolve_note("02B4", &notes).unwrap().title, "other");
}

#[test]
fn resolve_note_reports_missing_and_ambiguous_prefixes() {
    let notes = vec![note(FIRST, "first", &[], 1), note(SECOND, "second", &[], 2)];

    match resolve_note("0190a", &notes) {
        Err(CliError::AmbiguousId(message)) => {
            assert!(message.contains("ID prefix '0190a' is ambiguous"));
            assert!(message.contains("0190a000-0000"));
        }
        other => panic!("expected ambiguity, got {:?}", other.map(|n| n.id)),
    }
    assert!(matches!(
        resolve_note("ffff", &notes),
        Err(CliError::NoteNotFound(query)) if query == "ffff"
    ));
}

#[test]
fn resolve_reminder_uses_reminder_not_found() {
    let reminders = vec![reminder(FIRST, "stretch", Utc::now())];
    assert_eq!(resolve_reminder("0190", &reminders).unwrap().title, "stretch");
    assert!(matches!(
        resolve_reminder("abc", &reminders),
        Err(CliError::ReminderNotFound(_))
    ));
}

#[test]
fn format_relative_time_units() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(2), now), "2m ago");
    assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
    assert_eq!(format_relative_time(now - Duration::days(3), now), "3d ago");
    assert_eq!(format_relative_time(now - Duration::days(400), now), "1y ago");
}

#[test]
fn preview_collapses_whitespace_and_truncates() {
    assert_eq!(preview("  a   b  \nsecond line", 40), "a b");
    assert_eq!(preview("abcdefghij", 8), "abcde...");
    assert_eq!(preview("abcdefgh", 8), "abcdefgh");
}

#[test]
fn note_lines_show_type_and_tags() {
    let now = Utc::now();
    let notes = vec![note(FIRST, "Groceries", &["shopping", "food"], 5)];
    let lines = format_note_lines(&notes, now);

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0190a000-0000  text "));
    assert!(lines[0].contains("Groceries"));
    assert!(lines[0].ends_with("#shopping #food"));
}

#[test]
fn reminder_lines_show_priority_and_due_label() {
    let now = Utc::now();
    let reminders = vec![reminder(FIRST, "Stand up", now + Duration::minutes(5))];
    let lines = format_reminder_lines(&reminders, now);

    assert!(lines[0].contains("high  "));
    assert!(lines[0].ends_with("in 5 minutes"));
}

#[test]
fn normalize_tags_trims_dedups_and_keeps_order() {
    let tags = vec![
        " work ".to_string(),
        "#ideas".to_string(),
        String::new(),
        "work".to_string(),
    ];
    assert_eq!(normalize_tags(tags), vec!["work".to_string(), "ideas".to_string()]);
}

#[test]
fn build_patch_ignores_blank_fields_and_allows_clearing_tags() {
    let patch = build_patch(Some("  ".to_string()), None, Some(vec![]));
    assert_eq!(patch.title, None);
    assert_eq!(patch.tags, Some(vec![]));
    assert!(!patch.is_empty());

    assert!(build_patch(Some(" ".to_string()), Some(String::new()), None).is_empty());
}

#[test]
fn select_notes_applies_category_and_limit() {
    let notes = vec![
        note(FIRST, "Run plan", &["fitness"], 1),
        note(SECOND, "Rust tips", &["programming"], 2),
        note(OTHER, "Gym log", &["health"], 3),
    ];
    let options = ListOptions {
        query: None,
        kind: None,
        sort: NoteSort::Newest,
        category: Some("Health".to_string()),
        limit: 1,
        json: false,
    };

    let selected = select_notes(&notes, &options).unwrap();
    let titles: Vec<_> = selected.iter().map(|note| note.title.as_str()).collect();
    assert_eq!(titles, vec!["Run plan"]);

    let unknown = ListOptions {
        category: Some("sports".to_string()),
        ..options
    };
    assert!(matches!(
        select_notes(&notes, &unknown),
        Err(CliError::UnknownCategory(name)) if name == "sports"
    ));
}

#[test]
fn merge_profile_prefers_flags_then_env_then_existing() {
    let mut config = CliProfilesConfig::default();
    config.profiles.insert(
        "work".to_string(),
        CliProfile {
            supabase_url: Some("https://old.supabase.co".to_string()),
            supabase_anon_key: Some("old-key".to_string()),
            summarizer_url: Some("https://ai.example.com/summarize".to_string()),
        },
    );

    let merged = merge_profile(
        &mut config,
        "work",
        InitValues {
            supabase_url: Some("https://new.supabase.co".to_string()),
            ..InitValues::default()
        },
        |name| (name == "SUPABASE_ANON_KEY").then(|| "env-key".to_string()),
    )
    .unwrap();

    assert_eq!(merged.supabase_url.as_deref(), Some("https://new.supabase.co"));
    assert_eq!(merged.supabase_anon_key.as_deref(), Some("env-key"));
    assert_eq!(
        merged.summarizer_url.as_deref(),
        Some("https://ai.example.com/summarize")
    );
    assert_eq!(config.profile("work"), Some(&merged));
}

#[test]
fn merge_profile_rejects_invalid_supabase_url() {
    let mut config = CliProfilesConfig::default();
    let result = merge_profile(
        &mut config,
        "default",
        InitValues {
            supabase_url: Some("project.supabase.co".to_string()),
            supabase_anon_key: Some("key".to_string()),
            summarizer_url: None,
        },
        |_| None,
    );

    assert!(matches!(result, Err(CliError::Core(_))));
    assert!(config.profile("default").is_none());
}

#[test]
fn profile_file_written_by_init_merge_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli-config.json");

    let mut config = CliProfilesConfig::default();
    merge_profile(
        &mut config,
        "home",
        InitValues {
            supabase_url: Some("https://home.supabase.co/".to_string()),
            supabase_anon_key: Some("home-key".to_string()),
            summarizer_url: None,
        },
        |_| None,
    )
    .unwrap();
    config.active_profile = Some("home".to_string());
    config.save_to_path(&path).unwrap();

    let loaded = CliProfilesConfig::load_from_path(&path).unwrap();
    assert_eq!(loaded.resolve_profile_name_with_env(None, None), "home");
    let client = loaded
        .profile("home")
        .unwrap()
        .client_config_with(|_| None)
        .unwrap();
    assert_eq!(client.supabase_url, "https://home.supabase.co");
    assert_eq!(client.rest_url(), "https://home.supabase.co/rest/v1");
}

#[test]
fn mask_secret_keeps_edges() {
    assert_eq!(mask_secret("abcdefghijkl"), "abcd...ijkl");
    assert_eq!(mask_secret("short"), "*****");
}

#[test]
fn offline_core_errors_print_friendly_message() {
    let error = CliError::from(rememberly_core::Error::Network(
        "error sending request".to_string(),
    ));
    assert_eq!(error.user_message(), OFFLINE_MESSAGE);

    let error = CliError::from(rememberly_core::Error::Api("duplicate key".to_string()));
    assert_eq!(error.user_message(), "duplicate key");
}

#[derive(Default)]
struct RecordingScheduler {
    scheduled: Mutex<Vec<ReminderId>>,
    cancelled: Mutex<Vec<NotificationHandle>>,
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn request_permission(&self) -> rememberly_core::Result<bool> {
        Ok(true)
    }

    async fn schedule(
        &self,
        request: &NotificationRequest,
    ) -> rememberly_core::Result<NotificationHandle> {
        let mut scheduled = self.scheduled.lock().unwrap();
        scheduled.push(request.data.reminder_id);
        Ok(NotificationHandle::new(format!("timer-{}", scheduled.len())))
    }

    async fn cancel(&self, handle: &NotificationHandle) {
        self.cancelled.lock().unwrap().push(handle.clone());
    }

    async fn cancel_all(&self) {}
}

#[tokio::test]
async fn watch_rearms_only_changed_reminders() {
    let scheduler = RecordingScheduler::default();
    let mut armed = ArmedReminders::default();
    let at = Utc::now() + Duration::hours(1);
    let first = reminder(FIRST, "first", at);
    let second = reminder(SECOND, "second", at);

    let count = armed
        .sync(&scheduler, &[first.clone(), second.clone()])
        .await;
    assert_eq!(count, 2);
    assert_eq!(armed.sync(&scheduler, &[first.clone(), second]).await, 0);

    let moved = Reminder {
        remind_at: at + Duration::minutes(15),
        ..first
    };
    assert_eq!(armed.sync(&scheduler, &[moved]).await, 1);

    assert_eq!(armed.len(), 1);
    let mut cancelled: Vec<String> = scheduler
        .cancelled
        .lock()
        .unwrap()
        .iter()
        .map(|handle| handle.as_str().to_string())
        .collect();
    cancelled.sort();
    assert_eq!(cancelled, vec!["timer-1", "timer-2"]);
    assert_eq!(scheduler.scheduled.lock().unwrap().len(), 3);
}
