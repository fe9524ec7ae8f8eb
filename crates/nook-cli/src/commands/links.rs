use std::path::Path;

use nook_core::links::LinkGraph;
use nook_core::{Note, NoteId};
use serde::Serialize;

use crate::commands::common::{
    normalize_note_identifier, open_notebook, resolve_note, short_id, Session,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct LinkItem {
    pub id: String,
    pub title: String,
}

/// Links of one note, as printed by `nook links`
#[derive(Debug, Serialize)]
pub struct NoteLinks {
    pub id: String,
    pub title: String,
    pub outgoing: Vec<LinkItem>,
    pub backlinks: Vec<LinkItem>,
    pub unresolved: Vec<String>,
}

pub fn run_links(session: &Session, id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let notebook = open_notebook(db_path)?;
    let note = resolve_note(&normalized_id, &notebook, session.owner_id())?;
    let graph = notebook.link_graph(session.owner_id())?;
    let links = collect_links(&note, &graph);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    for line in format_link_lines(&links) {
        println!("{line}");
    }
    Ok(())
}

pub fn collect_links(note: &Note, graph: &LinkGraph) -> NoteLinks {
    let to_items = |ids: Vec<NoteId>| -> Vec<LinkItem> {
        ids.into_iter()
            .map(|id| LinkItem {
                title: graph
                    .nodes
                    .iter()
                    .find(|node| node.id == id)
                    .map_or_else(String::new, |node| node.title.clone()),
                id: id.to_string(),
            })
            .collect()
    };

    NoteLinks {
        id: note.id.to_string(),
        title: note.display_title().to_string(),
        outgoing: to_items(graph.outgoing(&note.id)),
        backlinks: to_items(graph.backlinks(&note.id)),
        unresolved: graph
            .unresolved
            .iter()
            .filter(|reference| reference.source == note.id)
            .map(|reference| reference.title.clone())
            .collect(),
    }
}

pub fn format_link_lines(links: &NoteLinks) -> Vec<String> {
    let mut lines = vec![format!("# {}", links.title)];

    let mut section = |heading: &str, items: Vec<String>| {
        lines.push(String::new());
        lines.push(format!("{heading} ({})", items.len()));
        lines.extend(items.into_iter().map(|item| format!("  {item}")));
    };

    let render = |items: &[LinkItem]| {
        items
            .iter()
            .map(|item| format!("{:<13}  {}", short_id(&item.id), item.title))
            .collect::<Vec<_>>()
    };
    section("Links to", render(&links.outgoing));
    section("Linked from", render(&links.backlinks));
    section(
        "Unresolved",
        links
            .unresolved
            .iter()
            .map(|title| format!("[[{title}]]"))
            .collect(),
    );

    lines
}
