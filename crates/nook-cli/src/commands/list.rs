use std::path::Path;

use crate::commands::common::{
    format_note_lines, note_to_list_item, open_store, NoteListItem, Session,
};
use crate::error::CliError;

pub fn run_list(
    session: &Session,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let notes = open_store(db_path)?.list_recent(session.owner_id(), limit)?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes yet. Create one with `nook add <TITLE> [CONTENT]`.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
