//! Remote data gateway for the `notes` and `reminders` tables.

mod memory;
mod postgrest;

use async_trait::async_trait;

use crate::models::{
    Note, NoteId, NoteInsert, NotePatch, Reminder, ReminderId, ReminderInsert, ReminderPatch,
};
use crate::Result;

pub use memory::{MemoryGateway, MemoryTables};
pub use postgrest::PostgrestGateway;

/// Table-scoped access to the remote store.
///
/// Row-level security on the server scopes every call to the signed-in user;
/// the explicit `user_id` filters mirror it on the client side.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// All notes owned by `user_id`, newest first.
    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>>;

    /// Insert a note and return the stored row.
    async fn insert_note(&self, note: &NoteInsert) -> Result<Note>;

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()>;

    async fn delete_note(&self, id: &NoteId) -> Result<()>;

    /// Non-completed reminders owned by `user_id`, earliest first.
    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>>;

    /// Insert a reminder and return the stored row.
    async fn insert_reminder(&self, reminder: &ReminderInsert) -> Result<Reminder>;

    async fn update_reminder(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()>;

    async fn delete_reminder(&self, id: &ReminderId) -> Result<()>;

    /// Cheap round trip proving the backend is reachable.
    async fn ping(&self) -> Result<()>;
}
