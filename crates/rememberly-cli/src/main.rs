//! Rememberly CLI - notes and reminders from the terminal
//!
//! Quick capture with generated titles and tags, plus reminders that fire
//! while `rememberly reminders watch` is running.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;
#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use rememberly_core::NoteType;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ReminderCommands};
use crate::commands::list::ListOptions;
use crate::commands::reminders::NewReminderArgs;
use crate::commands::{add, auth_cmd, categories, config, delete, edit, list, reminders};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {}", error.user_message());
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let default_directive = "rememberly=info"
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Add { content, kind }) => add::run_add(&content, kind, profile).await?,
        Some(Commands::List {
            query,
            kind,
            sort,
            category,
            limit,
            json,
        }) => {
            let options = ListOptions {
                query,
                kind,
                sort,
                category,
                limit,
                json,
            };
            list::run_list(options, profile).await?;
        }
        Some(Commands::Edit {
            id,
            title,
            summary,
            tags,
        }) => edit::run_edit(&id, title, summary, tags, profile).await?,
        Some(Commands::Delete { id }) => delete::run_delete(&id, profile).await?,
        Some(Commands::Categories { json }) => categories::run_categories(json, profile).await?,
        Some(Commands::Reminders(command)) => run_reminders(command, profile).await?,
        Some(Commands::Config(command)) => config::run_config(command, profile)?,
        Some(Commands::Auth(command)) => auth_cmd::run_auth(command, profile).await?,
        None => {
            // Quick capture mode: rememberly "my thought"
            if cli.note.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                add::run_add(&cli.note, NoteType::Text, profile).await?;
            }
        }
    }

    Ok(())
}

async fn run_reminders(command: ReminderCommands, profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ReminderCommands::List { json } => reminders::run_list(json, profile).await,
        ReminderCommands::Add {
            title,
            at,
            description,
            priority,
            note,
        } => {
            let args = NewReminderArgs {
                title,
                at,
                description,
                priority,
                note,
            };
            reminders::run_add(args, profile).await
        }
        ReminderCommands::Done { id } => reminders::run_done(&id, profile).await,
        ReminderCommands::Delete { id } => reminders::run_delete(&id, profile).await,
        ReminderCommands::Snooze { id, minutes } => {
            reminders::run_snooze(&id, minutes, profile).await
        }
        ReminderCommands::Watch => reminders::run_watch(profile).await,
    }
}
