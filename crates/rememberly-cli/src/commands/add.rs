use rememberly_core::capture::{compose_note, NoteDraft};
use rememberly_core::NoteType;

use crate::commands::common::{normalize_content, open_workspace, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    content_parts: &[String],
    kind: NoteType,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let input = if kind == NoteType::Text {
        resolve_note_content(content_parts)?
    } else {
        normalize_content(&content_parts.join(" ")).ok_or(CliError::EmptyContent)?
    };

    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let summarizer = workspace.summarizer()?;
    let draft = NoteDraft::new(kind, input);
    let new_note = compose_note(summarizer.as_ref(), &draft).await?;
    let note = workspace.context.notes().create_note(new_note).await?;

    println!("{}", note.id);
    eprintln!("Saved \"{}\" [{}]", note.title, note.tags.join(", "));
    Ok(())
}
