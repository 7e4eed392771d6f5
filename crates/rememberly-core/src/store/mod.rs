//! Session-scoped caches over the remote gateway.
//!
//! Each store keeps its state in a `watch` channel so front ends can
//! re-render on change. Only the store's own operations write to it.

mod notes;
mod reminders;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::auth::SessionSource;
use crate::error::{Error, Result};

pub use notes::{NotesState, NotesStore};
pub use reminders::{ReminderState, ReminderStore};

/// Progress and last failure of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatus {
    pub loading: bool,
    /// User-facing message for the last failed operation.
    pub error: Option<String>,
    /// The last failure was a connectivity problem.
    pub is_offline: bool,
}

pub(crate) trait HasStatus {
    fn status_mut(&mut self) -> &mut StoreStatus;
}

/// Identifies one store operation for staleness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

/// Tracks in-flight operations and which fetch started last.
#[derive(Debug, Default)]
pub(crate) struct RequestTracker {
    generation: AtomicU64,
    latest_fetch: AtomicU64,
    in_flight: AtomicUsize,
}

impl RequestTracker {
    /// Mark an operation as started: sets `loading` and clears the previous error.
    pub(crate) fn begin<S: HasStatus>(&self, state: &watch::Sender<S>) -> Ticket {
        let ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let status = state.status_mut();
            status.loading = true;
            status.error = None;
            status.is_offline = false;
        });
        ticket
    }

    /// Like [`RequestTracker::begin`], and marks the operation as the newest fetch.
    pub(crate) fn begin_fetch<S: HasStatus>(&self, state: &watch::Sender<S>) -> Ticket {
        let ticket = self.begin(state);
        self.latest_fetch.fetch_max(ticket.0, Ordering::SeqCst);
        ticket
    }

    /// Whether no other fetch started after `ticket`.
    pub(crate) fn is_latest_fetch(&self, ticket: Ticket) -> bool {
        self.latest_fetch.load(Ordering::SeqCst) == ticket.0
    }

    /// Mark an operation as finished, applying `update` and recording `error`.
    pub(crate) fn settle<S: HasStatus>(
        &self,
        state: &watch::Sender<S>,
        error: Option<&Error>,
        update: impl FnOnce(&mut S),
    ) {
        state.send_modify(|state| {
            update(state);
            let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            let status = state.status_mut();
            status.loading = remaining > 0;
            if let Some(error) = error {
                status.error = Some(error.user_message());
                status.is_offline = error.is_offline();
            }
        });
    }

    /// Settle with the outcome of `result`, applying `update` only on success.
    pub(crate) fn finish<S: HasStatus, T>(
        &self,
        state: &watch::Sender<S>,
        result: Result<T>,
        update: impl FnOnce(&mut S, &T),
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.settle(state, None, |state| update(state, &value));
                Ok(value)
            }
            Err(error) => {
                tracing::debug!("Store operation failed: {}", error);
                self.settle(state, Some(&error), |_| {});
                Err(error)
            }
        }
    }
}

type Write<S> = Box<dyn Fn(&mut S) + Send + Sync>;

/// Confirmed writes that finished while a fetch was in flight.
///
/// The fetched rows may predate those writes, so they are applied again on
/// top of the fetch result. Each write must be idempotent.
pub(crate) struct WriteReplay<S> {
    pending: Mutex<Option<(Ticket, Vec<Write<S>>)>>,
}

impl<S> Default for WriteReplay<S> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }
}

impl<S> WriteReplay<S> {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(Ticket, Vec<Write<S>>)>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start collecting writes for the fetch identified by `ticket`.
    pub(crate) fn open(&self, ticket: Ticket) {
        let mut pending = self.lock();
        let newer = match pending.as_ref() {
            Some((current, _)) => current.0 < ticket.0,
            None => true,
        };
        if newer {
            *pending = Some((ticket, Vec::new()));
        }
    }

    /// Apply `write` to `state` and keep it if a fetch is collecting.
    pub(crate) fn apply(&self, state: &mut S, write: impl Fn(&mut S) + Send + Sync + 'static) {
        write(state);
        if let Some((_, writes)) = self.lock().as_mut() {
            writes.push(Box::new(write));
        }
    }

    /// Re-apply the writes collected for `ticket`.
    pub(crate) fn replay_onto(&self, ticket: Ticket, state: &mut S) {
        if let Some((current, writes)) = self.lock().as_ref() {
            if *current == ticket {
                for write in writes {
                    write(state);
                }
            }
        }
    }

    /// Stop collecting for `ticket`. A newer fetch keeps its own collection.
    pub(crate) fn close(&self, ticket: Ticket) {
        let mut pending = self.lock();
        if pending.as_ref().is_some_and(|(current, _)| *current == ticket) {
            *pending = None;
        }
    }
}

/// Resolve the signed-in user's id or fail with [`Error::Unauthenticated`].
pub(crate) async fn require_user(session: &Arc<dyn SessionSource>) -> Result<String> {
    session.user_id().await?.ok_or(Error::Unauthenticated)
}
