use crate::commands::common::{normalize_identifier, open_workspace, resolve_note};
use crate::error::CliError;

pub async fn run_delete(id: &str, profile: Option<&str>) -> Result<(), CliError> {
    let normalized_id = normalize_identifier(id)?;
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let notes = workspace.context.notes().fetch_notes().await?;
    let note = resolve_note(&normalized_id, &notes)?;

    workspace.context.notes().delete_note(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
