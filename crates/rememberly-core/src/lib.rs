//! rememberly-core - Core library for Rememberly
//!
//! Models, the remote gateway, Supabase auth, session-scoped stores,
//! reminder notifications and the note capture flow shared by Rememberly
//! front ends.

pub mod auth;
pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod search;
pub mod store;
pub mod summarize;
pub mod util;

pub use context::AppContext;
pub use error::{Error, Result};
pub use models::{Note, NoteId, NoteType, Reminder, ReminderId};
