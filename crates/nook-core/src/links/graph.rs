//! Note link graph built from `[[Title]]` references

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Note, NoteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: NoteId,
    pub title: String,
}

/// Directed link from the referencing note to the referenced one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub source: NoteId,
    pub target: NoteId,
}

/// A reference whose title matches no note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub source: NoteId,
    pub title: String,
}

/// Links between one owner's notes.
///
/// Titles are not unique. A reference resolves to the first note carrying
/// that exact title, ordered by `created_at` and then `id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub unresolved: Vec<UnresolvedReference>,
    #[serde(skip)]
    titles: HashMap<String, NoteId>,
}

impl LinkGraph {
    pub fn build(notes: &[Note]) -> Self {
        let mut ordered: Vec<&Note> = notes.iter().collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut titles = HashMap::new();
        for note in &ordered {
            if !note.title.is_empty() {
                titles.entry(note.title.clone()).or_insert(note.id);
            }
        }

        let mut graph = Self {
            nodes: ordered
                .iter()
                .map(|note| GraphNode {
                    id: note.id,
                    title: note.display_title().to_string(),
                })
                .collect(),
            titles,
            ..Self::default()
        };

        let mut seen = HashSet::new();
        for note in &ordered {
            for reference in note.references() {
                match graph.titles.get(&reference.title) {
                    Some(&target) if target == note.id => {}
                    Some(&target) => {
                        let edge = GraphEdge {
                            source: note.id,
                            target,
                        };
                        if seen.insert(edge) {
                            graph.edges.push(edge);
                        }
                    }
                    None => graph.unresolved.push(UnresolvedReference {
                        source: note.id,
                        title: reference.title,
                    }),
                }
            }
        }

        graph
    }

    /// Note a title resolves to, if any
    pub fn resolve_title(&self, title: &str) -> Option<NoteId> {
        self.titles.get(title).copied()
    }

    /// Notes referenced by `id`
    pub fn outgoing(&self, id: &NoteId) -> Vec<NoteId> {
        self.edges
            .iter()
            .filter(|edge| edge.source == *id)
            .map(|edge| edge.target)
            .collect()
    }

    /// Notes referencing `id`
    pub fn backlinks(&self, id: &NoteId) -> Vec<NoteId> {
        self.edges
            .iter()
            .filter(|edge| edge.target == *id)
            .map(|edge| edge.source)
            .collect()
    }
}
