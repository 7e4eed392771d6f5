//! Data models for Rememberly

mod category;
mod note;
mod reminder;

pub use category::{category_counts, notes_in_category, Category, BUILTIN_CATEGORIES};
pub use note::{NewNote, Note, NoteId, NoteInsert, NotePatch, NoteType};
pub use reminder::{
    format_reminder_time, natural_input, parse_reminder_time, partition_due, NewReminder,
    NotificationHandle, Priority, Reminder, ReminderId, ReminderInsert, ReminderPatch,
    SNOOZE_PRESETS_MINUTES,
};
