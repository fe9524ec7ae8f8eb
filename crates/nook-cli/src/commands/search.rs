use std::path::Path;

use nook_core::models::SearchHit;
use serde::Serialize;

use crate::commands::common::{
    format_note_lines, normalize_search_query, note_to_list_item, open_notebook, NoteListItem,
    Session,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    #[serde(flatten)]
    pub note: NoteListItem,
    pub snippet: String,
}

pub fn run_search(
    session: &Session,
    query: &str,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let hits = search_notes(session, &normalized_query, limit, db_path)?;

    if as_json {
        let json_items = hits
            .iter()
            .map(|hit| SearchResultItem {
                note: note_to_list_item(&hit.note),
                snippet: hit.snippet.clone(),
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if hits.is_empty() {
        println!("No notes match '{normalized_query}'.");
    } else {
        for line in format_search_lines(&hits) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn search_notes(
    session: &Session,
    query: &str,
    limit: usize,
    db_path: &Path,
) -> Result<Vec<SearchHit>, CliError> {
    Ok(open_notebook(db_path)?.search_notes(session.owner_id(), query, limit)?)
}

/// One list line per hit, followed by its snippet when there is one.
pub fn format_search_lines(hits: &[SearchHit]) -> Vec<String> {
    let notes = hits.iter().map(|hit| hit.note.clone()).collect::<Vec<_>>();
    let mut lines = Vec::with_capacity(hits.len() * 2);
    for (line, hit) in format_note_lines(&notes).into_iter().zip(hits) {
        lines.push(line);
        if !hit.snippet.is_empty() {
            lines.push(format!("    {}", hit.snippet));
        }
    }
    lines
}
