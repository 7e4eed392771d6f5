pub mod add;
pub mod auth_cmd;
pub mod categories;
pub mod common;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod reminders;
