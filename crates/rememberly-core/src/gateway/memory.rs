//! In-process gateway backed by plain vectors.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::RemoteGateway;
use crate::error::{Error, Result};
use crate::models::{
    Note, NoteId, NoteInsert, NotePatch, Reminder, ReminderId, ReminderInsert, ReminderPatch,
};

/// Snapshot of the rows held by a [`MemoryGateway`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTables {
    pub notes: Vec<Note>,
    pub reminders: Vec<Reminder>,
}

/// Gateway that keeps rows in memory.
///
/// Failures can be queued with [`MemoryGateway::fail_next`]; each queued error
/// is returned by the next gateway call, whichever it is.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: Mutex<MemoryTables>,
    failures: Mutex<VecDeque<Error>>,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tables(tables: MemoryTables) -> Self {
        Self {
            tables: Mutex::new(tables),
            failures: Mutex::default(),
        }
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: Error) {
        lock(&self.failures).push_back(error);
    }

    #[must_use]
    pub fn snapshot(&self) -> MemoryTables {
        lock(&self.tables).clone()
    }

    fn take_failure(&self) -> Result<()> {
        lock(&self.failures).pop_front().map_or(Ok(()), Err)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.take_failure()?;
        let mut notes: Vec<Note> = lock(&self.tables)
            .notes
            .iter()
            .filter(|note| note.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn insert_note(&self, insert: &NoteInsert) -> Result<Note> {
        self.take_failure()?;
        let now = Utc::now();
        let new = &insert.note;
        let note = Note {
            id: NoteId::new(),
            user_id: insert.user_id.clone(),
            title: new.title.clone(),
            original_content: new.original_content.clone(),
            summary: new.summary.clone(),
            kind: new.kind,
            tags: new.tags.clone(),
            source_url: new.source_url.clone(),
            file_url: new.file_url.clone(),
            created_at: now,
            updated_at: now,
        };
        lock(&self.tables).notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        self.take_failure()?;
        let now = Utc::now();
        if let Some(note) = lock(&self.tables).notes.iter_mut().find(|n| n.id == *id) {
            note.apply(patch, now);
        }
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.take_failure()?;
        lock(&self.tables).notes.retain(|note| note.id != *id);
        Ok(())
    }

    async fn list_active_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        self.take_failure()?;
        let mut reminders: Vec<Reminder> = lock(&self.tables)
            .reminders
            .iter()
            .filter(|reminder| reminder.user_id == user_id && !reminder.is_completed)
            .cloned()
            .collect();
        reminders.sort_by_key(|reminder| reminder.remind_at);
        Ok(reminders)
    }

    async fn insert_reminder(&self, insert: &ReminderInsert) -> Result<Reminder> {
        self.take_failure()?;
        let reminder = Reminder {
            id: ReminderId::new(),
            user_id: insert.user_id.clone(),
            note_id: insert.note_id,
            title: insert.title.clone(),
            description: insert.description.clone(),
            remind_at: insert.remind_at,
            priority: insert.priority,
            is_completed: insert.is_completed,
            notification_id: None,
            natural_input: insert.natural_input.clone(),
            created_at: Utc::now(),
        };
        lock(&self.tables).reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn update_reminder(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()> {
        self.take_failure()?;
        if let Some(reminder) = lock(&self.tables)
            .reminders
            .iter_mut()
            .find(|r| r.id == *id)
        {
            patch.apply_to(reminder);
        }
        Ok(())
    }

    async fn delete_reminder(&self, id: &ReminderId) -> Result<()> {
        self.take_failure()?;
        lock(&self.tables).reminders.retain(|reminder| reminder.id != *id);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.take_failure()
    }
}
