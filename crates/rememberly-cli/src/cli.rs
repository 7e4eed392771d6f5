use clap::{Parser, Subcommand};
use rememberly_core::models::Priority;
use rememberly_core::search::NoteSort;
use rememberly_core::NoteType;

#[derive(Parser)]
#[command(name = "rememberly")]
#[command(about = "Capture notes and reminders from the terminal")]
#[command(version)]
pub struct Cli {
    /// Profile name (overrides REMEMBERLY_PROFILE and the active profile)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quick capture: rememberly "My note here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a new note
    Add {
        /// Note content, URL, or file reference
        content: Vec<String>,
        /// Kind of note: text, url, file or image
        #[arg(short = 't', long = "type", default_value = "text", value_name = "TYPE")]
        kind: NoteType,
    },
    /// List notes
    List {
        /// Only notes whose title, content, summary or tags contain this text
        #[arg(short, long)]
        query: Option<String>,
        /// Only notes of this type
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        kind: Option<NoteType>,
        /// Sort order: newest, oldest, title or type
        #[arg(short, long, default_value = "newest")]
        sort: NoteSort,
        /// Only notes in a built-in category (health, technology, finance, news)
        #[arg(short, long)]
        category: Option<String>,
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a note by ID or prefix
    Edit {
        /// Note ID or unique prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New summary
        #[arg(long)]
        summary: Option<String>,
        /// Replace tags (comma separated)
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        tags: Option<Vec<String>>,
    },
    /// Delete a note by ID or prefix
    Delete {
        /// Note ID or unique prefix
        id: String,
    },
    /// Show note counts per built-in category
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage reminders
    #[command(subcommand)]
    Reminders(ReminderCommands),
    /// Manage CLI profile config
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Authenticate CLI profile
    #[command(subcommand)]
    Auth(AuthCommands),
}

#[derive(Subcommand)]
pub enum ReminderCommands {
    /// List active reminders, overdue first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a reminder and schedule its notification
    Add {
        /// Reminder title
        #[arg(required = true)]
        title: Vec<String>,
        /// When to remind: `in 30 minutes`, `2h`, `tomorrow`, `2026-01-31 09:00`
        #[arg(long, value_name = "WHEN")]
        at: String,
        /// Optional longer description
        #[arg(short, long)]
        description: Option<String>,
        /// Priority: low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Link to a note by ID or prefix
        #[arg(long, value_name = "NOTE")]
        note: Option<String>,
    },
    /// Mark a reminder as completed
    Done {
        /// Reminder ID or unique prefix
        id: String,
    },
    /// Delete a reminder
    Delete {
        /// Reminder ID or unique prefix
        id: String,
    },
    /// Push a reminder back
    Snooze {
        /// Reminder ID or unique prefix
        id: String,
        /// Minutes to snooze (presets: 15, 60, 1440)
        #[arg(
            short,
            long,
            default_value = "15",
            value_parser = clap::value_parser!(i64).range(1..)
        )]
        minutes: i64,
    },
    /// Stay in the foreground and print reminders as they come due
    Watch,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Optional summarizer endpoint
        #[arg(long, value_name = "URL")]
        summarizer_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile config
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create a Supabase account
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Login with Supabase email/password and store session in keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status,
    /// Logout profile, cancel pending notifications and clear stored session
    Logout,
}
