use std::path::Path;

use nook_core::services::NoteUpdate;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_note_identifier, open_notebook, resolve_note,
    Session,
};
use crate::error::CliError;

pub fn run_edit(session: &Session, id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let notebook = open_notebook(db_path)?;
    let note = resolve_note(&normalized_id, &notebook, session.owner_id())?;

    let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited_content == note.content {
        println!("{}", note.id);
        return Ok(());
    }

    let updated = notebook.update_note(
        session.owner_id(),
        &note.id,
        NoteUpdate::content(edited_content),
    )?;
    println!("{}", updated.note.id);
    Ok(())
}
