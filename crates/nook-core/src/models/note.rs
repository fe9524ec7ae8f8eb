//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::timestamp::{next_updated_at, now_millis};
use crate::links::{extract_references, Reference};

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier, stable across sync
    pub id: NoteId,
    /// Principal the note belongs to (store partition key)
    pub owner_id: String,
    /// Display title, target of `[[Title]]` references
    pub title: String,
    /// Markdown-flavoured body
    pub content: String,
    /// Creation timestamp (Unix ms), never mutated
    pub created_at: i64,
    /// Last update timestamp (Unix ms), the only conflict signal
    pub updated_at: i64,
    /// Whether `content` holds ciphertext
    pub is_encrypted: bool,
}

impl Note {
    /// Create a new note for `owner_id`
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: NoteId::new(),
            owner_id: owner_id.into(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            is_encrypted: false,
        }
    }

    /// Advance `updated_at` for a content or title mutation.
    pub fn touch(&mut self) {
        self.updated_at = next_updated_at(self.updated_at);
    }

    /// Title for display; untitled notes render as `Untitled`.
    #[must_use]
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            "Untitled"
        } else {
            title
        }
    }

    /// Cross-note references found in the content, in order of appearance.
    #[must_use]
    pub fn references(&self) -> Vec<Reference> {
        extract_references(&self.content)
    }
}
