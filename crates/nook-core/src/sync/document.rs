//! Document-store transport: one JSON document per note on a filesystem tree.
//!
//! Layout is `<root>/users/<owner>/notes/<id>.json`. The directory can live on
//! a shared or synced volume and act as the remote authority for several
//! devices.

use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use super::resolver::{resolve, Resolution};
use super::transport::{PulledNotes, SyncTransport, TransportError, TransportResult};
use super::wire::{decode_note, WireNote};
use crate::models::{Note, Principal};

#[derive(Debug, Clone)]
pub struct DocumentStoreTransport {
    root: PathBuf,
}

impl DocumentStoreTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, owner_id: &str) -> TransportResult<PathBuf> {
        validate_segment(owner_id)?;
        Ok(self.root.join("users").join(owner_id).join("notes"))
    }

    async fn read_document(path: &Path, owner_id: &str) -> TransportResult<Option<Note>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        // A corrupt document is replaced by the pushed copy.
        let note = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|value| decode_note(&value, owner_id).ok());
        if note.is_none() {
            tracing::warn!(path = %path.display(), "Overwriting malformed note document");
        }
        Ok(note)
    }

    async fn write_document(dir: &Path, note: &Note) -> TransportResult<()> {
        let path = dir.join(format!("{}.json", note.id));
        let temp = dir.join(format!(".{}.{}.tmp", note.id, Uuid::new_v4().simple()));
        let payload = serde_json::to_vec_pretty(&WireNote::from(note))?;

        tokio::fs::write(&temp, payload).await?;
        if let Err(error) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(error.into());
        }
        Ok(())
    }
}

impl SyncTransport for DocumentStoreTransport {
    async fn push(&self, principal: &Principal, notes: &[Note]) -> TransportResult<()> {
        let owner_id = principal.owner_id();
        let dir = self.collection_dir(owner_id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let mut written = 0usize;
        for note in notes {
            let path = dir.join(format!("{}.json", note.id));
            let existing = Self::read_document(&path, owner_id).await?;
            if resolve(existing.as_ref(), note) == Resolution::KeepLocal {
                continue;
            }

            let mut note = note.clone();
            if let Some(existing) = existing {
                note.created_at = existing.created_at;
            }
            Self::write_document(&dir, &note).await?;
            written += 1;
        }

        tracing::debug!(owner = owner_id, pushed = notes.len(), written, "Pushed note documents");
        Ok(())
    }

    async fn pull(&self, principal: &Principal) -> TransportResult<PulledNotes> {
        let owner_id = principal.owner_id();
        let dir = self.collection_dir(owner_id)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PulledNotes::default())
            }
            Err(error) => return Err(error.into()),
        };

        let mut pulled = PulledNotes::default();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let bytes = tokio::fs::read(&path).await?;
            let decoded = serde_json::from_slice::<Value>(&bytes)
                .map_err(|error| error.to_string())
                .and_then(|value| decode_note(&value, owner_id).map_err(|error| error.to_string()));
            match decoded {
                Ok(note) => pulled.notes.push(note),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping malformed note document");
                    pulled.rejected += 1;
                }
            }
        }

        pulled
            .notes
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pulled)
    }
}

fn validate_segment(owner_id: &str) -> TransportResult<()> {
    let invalid = owner_id.trim().is_empty()
        || owner_id == "."
        || owner_id == ".."
        || owner_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(TransportError::InvalidConfiguration(format!(
            "owner id `{owner_id}` cannot name a document collection"
        )));
    }
    Ok(())
}
