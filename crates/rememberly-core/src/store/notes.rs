//! Notes cache.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use super::{require_user, HasStatus, RequestTracker, StoreStatus, WriteReplay};
use crate::auth::SessionSource;
use crate::error::Result;
use crate::gateway::RemoteGateway;
use crate::models::{NewNote, Note, NoteId, NoteInsert, NotePatch};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesState {
    /// Newest first.
    pub notes: Vec<Note>,
    pub status: StoreStatus,
}

impl HasStatus for NotesState {
    fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }
}

/// The signed-in user's notes, reconciled with the remote table after each
/// confirmed write.
pub struct NotesStore {
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<dyn SessionSource>,
    state: watch::Sender<NotesState>,
    tracker: RequestTracker,
    replay: WriteReplay<NotesState>,
}

impl NotesStore {
    pub fn new(gateway: Arc<dyn RemoteGateway>, session: Arc<dyn SessionSource>) -> Self {
        Self {
            gateway,
            session,
            state: watch::channel(NotesState::default()).0,
            tracker: RequestTracker::default(),
            replay: WriteReplay::default(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> NotesState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NotesState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.state
            .borrow()
            .notes
            .iter()
            .find(|note| note.id == *id)
            .cloned()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| {
            state.status.error = None;
            state.status.is_offline = false;
        });
    }

    /// Drop every cached note, e.g. on sign-out.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.notes.clear();
            state.status.error = None;
            state.status.is_offline = false;
        });
    }

    /// Replace the cache with the user's notes.
    ///
    /// A result that arrives after a newer fetch started is discarded. Writes
    /// confirmed while the fetch was in flight are applied again on top of it.
    pub async fn fetch_notes(&self) -> Result<Vec<Note>> {
        let ticket = self.tracker.begin_fetch(&self.state);
        self.replay.open(ticket);
        let result = match require_user(&self.session).await {
            Ok(user_id) => self.gateway.list_notes(&user_id).await,
            Err(error) => Err(error),
        };

        if !self.tracker.is_latest_fetch(ticket) {
            tracing::debug!("Discarding superseded notes fetch");
            self.tracker.settle(&self.state, None, |_| {});
            self.replay.close(ticket);
            return result;
        }

        let result = result.map(|mut notes| {
            sort_newest_first(&mut notes);
            notes
        });
        let outcome = self.tracker.finish(&self.state, result, |state, notes| {
            if !self.tracker.is_latest_fetch(ticket) {
                return;
            }
            state.notes.clone_from(notes);
            self.replay.replay_onto(ticket, state);
            sort_newest_first(&mut state.notes);
        });
        self.replay.close(ticket);
        outcome
    }

    /// Insert a note for the signed-in user and prepend it to the cache.
    pub async fn create_note(&self, note: NewNote) -> Result<Note> {
        let _ticket = self.tracker.begin(&self.state);
        let result = match require_user(&self.session).await {
            Ok(user_id) => {
                let insert = NoteInsert { user_id, note };
                self.gateway.insert_note(&insert).await
            }
            Err(error) => Err(error),
        };

        self.tracker.finish(&self.state, result, |state, note| {
            tracing::info!(note_id = %note.id, "Created note");
            let note = note.clone();
            self.replay.apply(state, move |state| {
                if !state.notes.iter().any(|cached| cached.id == note.id) {
                    state.notes.insert(0, note.clone());
                }
            });
        })
    }

    pub async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<()> {
        let _ticket = self.tracker.begin(&self.state);
        let result = match require_user(&self.session).await {
            Ok(_) => self.gateway.update_note(id, &patch).await,
            Err(error) => Err(error),
        };

        let now = Utc::now();
        let id = *id;
        self.tracker.finish(&self.state, result, |state, _| {
            self.replay.apply(state, move |state| {
                if let Some(note) = state.notes.iter_mut().find(|note| note.id == id) {
                    note.apply(&patch, now);
                }
            });
        })
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let _ticket = self.tracker.begin(&self.state);
        let result = match require_user(&self.session).await {
            Ok(_) => self.gateway.delete_note(id).await,
            Err(error) => Err(error),
        };

        let id = *id;
        self.tracker.finish(&self.state, result, |state, _| {
            self.replay
                .apply(state, move |state| state.notes.retain(|note| note.id != id));
        })
    }
}

fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
