//! Note editing on top of a [`NoteStore`].

use std::sync::Arc;

use crate::db::NoteStore;
use crate::error::{Error, Result};
use crate::links::{rewrite_references_in, LinkGraph};
use crate::models::{Note, NoteId, SearchHit, SearchQuery};

/// Fields to change on an existing note. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }
}

/// Result of [`Notebook::update_note`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedNote {
    pub note: Note,
    /// Other notes whose `[[Old Title]]` references were rewritten
    pub references_rewritten: usize,
    /// False when the update matched the stored note and nothing was written
    pub changed: bool,
}

/// Note operations for one store, shared by clients.
pub struct Notebook<S> {
    store: Arc<S>,
}

impl<S> Clone for Notebook<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: NoteStore> Notebook<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn create_note(&self, owner_id: &str, title: &str, content: &str) -> Result<Note> {
        let note = Note::new(owner_id, title.trim(), content);
        self.store.put(&note)?;
        tracing::debug!(owner = owner_id, id = %note.id, "Created note");
        Ok(note)
    }

    pub fn get_note(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>> {
        self.store.get(owner_id, id)
    }

    pub fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        self.store.list_by_owner(owner_id)
    }

    /// Apply `update` to a note.
    ///
    /// A title change rewrites inbound `[[Old]]` references in the owner's
    /// other notes. The rewrite and the note's own write share one
    /// transaction.
    pub fn update_note(&self, owner_id: &str, id: &NoteId, update: NoteUpdate) -> Result<UpdatedNote> {
        let new_title = update.title.as_deref().map(str::trim);

        self.store.transaction(|tx| {
            let current = tx
                .get(owner_id, id)?
                .ok_or_else(|| Error::NotFound(id.to_string()))?;

            let references_rewritten = match new_title {
                Some(new_title) if new_title != current.title => {
                    rewrite_references_in(tx, owner_id, &current.title, new_title)?
                }
                _ => 0,
            };

            // The rewrite may have touched this note too.
            let mut note = if references_rewritten > 0 {
                tx.get(owner_id, id)?
                    .ok_or_else(|| Error::NotFound(id.to_string()))?
            } else {
                current
            };

            let mut changed = false;
            if let Some(title) = new_title {
                if note.title != title {
                    note.title = title.to_string();
                    changed = true;
                }
            }
            if let Some(content) = &update.content {
                if note.content != *content {
                    note.content.clone_from(content);
                    changed = true;
                }
            }

            if changed {
                note.touch();
                tx.put(&note)?;
            }

            Ok(UpdatedNote {
                note,
                references_rewritten,
                changed,
            })
        })
    }

    /// Change a note's title, rewriting inbound references.
    pub fn rename_note(&self, owner_id: &str, id: &NoteId, new_title: &str) -> Result<UpdatedNote> {
        self.update_note(owner_id, id, NoteUpdate::title(new_title))
    }

    /// Notes whose title or content contains every term of `query`,
    /// case-insensitively. A blank query finds nothing.
    pub fn search_notes(&self, owner_id: &str, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let Some(query) = SearchQuery::parse(query) else {
            return Ok(Vec::new());
        };
        self.store.search(owner_id, &query, limit)
    }

    pub fn link_graph(&self, owner_id: &str) -> Result<LinkGraph> {
        Ok(LinkGraph::build(&self.store.list_by_owner(owner_id)?))
    }
}
