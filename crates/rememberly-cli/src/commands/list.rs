use chrono::Utc;
use rememberly_core::models::{notes_in_category, Category};
use rememberly_core::search::{NoteFilter, NoteSort};
use rememberly_core::{Note, NoteType};

use crate::commands::common::{format_note_lines, note_to_list_item, open_workspace, NoteListItem};
use crate::error::CliError;

pub struct ListOptions {
    pub query: Option<String>,
    pub kind: Option<NoteType>,
    pub sort: NoteSort,
    pub category: Option<String>,
    pub limit: usize,
    pub json: bool,
}

pub async fn run_list(options: ListOptions, profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let notes = workspace.context.notes().fetch_notes().await?;
    let notes = select_notes(&notes, &options)?;

    let now = Utc::now();
    if options.json {
        let json_items = notes
            .iter()
            .map(|note| note_to_list_item(note, now))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes, now) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Apply query, type, category, sort and limit to the fetched notes.
pub fn select_notes(notes: &[Note], options: &ListOptions) -> Result<Vec<Note>, CliError> {
    let filter = NoteFilter {
        query: options.query.clone().unwrap_or_default(),
        kind: options.kind,
        sort: options.sort,
    };
    let mut selected = filter.apply(notes);

    if let Some(key) = options.category.as_deref() {
        let category =
            Category::find(key).ok_or_else(|| CliError::UnknownCategory(key.to_string()))?;
        selected = notes_in_category(&selected, category)
            .into_iter()
            .cloned()
            .collect();
    }

    selected.truncate(options.limit);
    Ok(selected)
}
