use std::path::Path;

use crate::commands::common::{normalize_content, open_notebook, read_piped_stdin, Session};
use crate::error::CliError;

pub fn run_add(
    session: &Session,
    title: &str,
    content_parts: &[String],
    db_path: &Path,
) -> Result<(), CliError> {
    let title = normalize_content(title).ok_or(CliError::EmptyTitle)?;
    let content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => content,
        None => read_piped_stdin()?.unwrap_or_default(),
    };

    let notebook = open_notebook(db_path)?;
    let note = notebook.create_note(session.owner_id(), &title, &content)?;

    println!("{}", note.id);
    Ok(())
}
