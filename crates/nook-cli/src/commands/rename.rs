use std::path::Path;

use crate::commands::common::{
    normalize_note_identifier, normalize_title, open_notebook, resolve_note, short_id, Session,
};
use crate::error::CliError;

pub fn run_rename(
    session: &Session,
    id: &str,
    title_parts: &[String],
    db_path: &Path,
) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let new_title = normalize_title(title_parts)?;
    let notebook = open_notebook(db_path)?;
    let note = resolve_note(&normalized_id, &notebook, session.owner_id())?;

    let updated = notebook.rename_note(session.owner_id(), &note.id, &new_title)?;
    let short_id = short_id(&updated.note.id.to_string());
    if !updated.changed {
        println!("{short_id}  title unchanged");
        return Ok(());
    }

    println!(
        "{short_id}  '{}' -> '{}'  ({} linking {} updated)",
        note.title,
        updated.note.title,
        updated.references_rewritten,
        if updated.references_rewritten == 1 { "note" } else { "notes" }
    );
    Ok(())
}
