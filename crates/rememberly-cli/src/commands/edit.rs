use rememberly_core::models::NotePatch;
use rememberly_core::util::normalize_text_option;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_identifier, normalize_tags, open_workspace,
    resolve_note,
};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    summary: Option<String>,
    tags: Option<Vec<String>>,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let normalized_id = normalize_identifier(id)?;
    let flags_given = title.is_some() || summary.is_some() || tags.is_some();
    let mut patch = build_patch(title, summary, tags);
    if flags_given && patch.is_empty() {
        return Err(CliError::EmptyPatch);
    }

    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;
    let notes = workspace.context.notes().fetch_notes().await?;
    let note = resolve_note(&normalized_id, &notes)?;

    if patch.is_empty() {
        let edited = capture_editor_input_with_initial(&note.original_content)?
            .ok_or(CliError::EmptyEditedContent)?;
        if edited == note.original_content {
            println!("{}", note.id);
            return Ok(());
        }
        patch.original_content = Some(edited);
    }

    workspace.context.notes().update_note(&note.id, patch).await?;
    println!("{}", note.id);
    Ok(())
}

/// Patch from command-line flags; blank title or summary is ignored and an
/// empty tag list clears the tags.
pub fn build_patch(
    title: Option<String>,
    summary: Option<String>,
    tags: Option<Vec<String>>,
) -> NotePatch {
    NotePatch {
        title: normalize_text_option(title),
        summary: normalize_text_option(summary),
        tags: tags.map(normalize_tags),
        original_content: None,
    }
}
