use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] rememberly_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Nothing to update; pass --title, --summary or --tags, or omit them to edit the content")]
    EmptyPatch,
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("Reminder not found for id/prefix: {0}")]
    ReminderNotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Unknown category '{0}'. Available: health, technology, finance, news")]
    UnknownCategory(String),
    #[error("Could not understand reminder time '{0}'. Use e.g. `in 30 minutes`, `2h`, `tomorrow` or `2026-01-31 09:00`")]
    InvalidReminderTime(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Profile '{0}' is not signed in. Run `rememberly auth login --email <email> --password <password>` first.")]
    NotSignedIn(String),
}

impl CliError {
    /// Message printed to the terminal; connectivity failures get the
    /// friendly offline text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Core(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}
