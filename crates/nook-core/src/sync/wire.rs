//! Wire schema for notes exchanged with a remote.
//!
//! Outgoing notes are strongly typed. Incoming records are read as loose JSON
//! and validated one by one so a single bad record never sinks a whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::PulledNotes;
use crate::models::timestamp::normalize_timestamp;
use crate::models::{Note, NoteId};

/// A note as sent over the wire. `ownerId` is implied by the request scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNote {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_encrypted: bool,
}

impl From<&Note> for WireNote {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
            updated_at: note.updated_at,
            is_encrypted: note.is_encrypted,
        }
    }
}

/// Body of `POST /sync`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRequestBody<N = WireNote> {
    #[serde(default = "Vec::new")]
    pub notes: Vec<N>,
}

/// Successful response of `POST /sync`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponseBody<N = WireNote> {
    pub success: bool,
    pub notes: Vec<N>,
}

/// Why an incoming record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedNote {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("invalid field `{0}`")]
    Invalid(&'static str),
}

/// Validate one incoming record into a note owned by `owner_id`.
pub fn decode_note(value: &Value, owner_id: &str) -> Result<Note, MalformedNote> {
    let record = value.as_object().ok_or(MalformedNote::NotAnObject)?;
    let field = |name: &'static str| record.get(name).filter(|value| !value.is_null());

    let id = field("id")
        .ok_or(MalformedNote::Missing("id"))?
        .as_str()
        .and_then(|id| id.parse::<NoteId>().ok())
        .ok_or(MalformedNote::Invalid("id"))?;

    let created_at = field("createdAt")
        .ok_or(MalformedNote::Missing("createdAt"))
        .and_then(|value| normalize_timestamp(value).ok_or(MalformedNote::Invalid("createdAt")))?;
    let updated_at = field("updatedAt")
        .ok_or(MalformedNote::Missing("updatedAt"))
        .and_then(|value| normalize_timestamp(value).ok_or(MalformedNote::Invalid("updatedAt")))?;

    let title = optional_text(field("title"), "title")?;
    let content = optional_text(field("content"), "content")?;

    let is_encrypted = match field("isEncrypted") {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        // SQLite-backed peers send 0/1.
        Some(Value::Number(number)) => match number.as_i64() {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(MalformedNote::Invalid("isEncrypted")),
        },
        Some(_) => return Err(MalformedNote::Invalid("isEncrypted")),
    };

    Ok(Note {
        id,
        owner_id: owner_id.to_string(),
        title,
        content,
        created_at,
        updated_at,
        is_encrypted,
    })
}

/// Validate a batch, skipping and counting malformed records.
pub fn decode_notes(values: &[Value], owner_id: &str) -> PulledNotes {
    let mut pulled = PulledNotes::default();
    for (index, value) in values.iter().enumerate() {
        match decode_note(value, owner_id) {
            Ok(note) => pulled.notes.push(note),
            Err(error) => {
                tracing::warn!(index, %error, "Skipping malformed remote note");
                pulled.rejected += 1;
            }
        }
    }
    pulled
}

fn optional_text(value: Option<&Value>, name: &'static str) -> Result<String, MalformedNote> {
    match value {
        None => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(MalformedNote::Invalid(name)),
    }
}
