use std::path::Path;

use crate::commands::common::{
    format_timestamp, normalize_note_identifier, open_notebook, resolve_note, Session,
};
use crate::error::CliError;

pub fn run_show(session: &Session, id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let notebook = open_notebook(db_path)?;
    let note = resolve_note(&normalized_id, &notebook, session.owner_id())?;

    println!("# {}", note.display_title());
    println!("id:      {}", note.id);
    println!("created: {}", format_timestamp(note.created_at));
    println!("updated: {}", format_timestamp(note.updated_at));
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
    Ok(())
}
