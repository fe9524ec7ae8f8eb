//! Last-write-wins conflict resolution

use crate::db::{NoteAccess, NoteStore};
use crate::error::Result;
use crate::models::Note;

/// Which copy of a note survives a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    KeepLocal,
    TakeRemote,
}

/// Decide between the local copy of a note and an incoming one.
///
/// The incoming copy wins only when there is no local copy or its
/// `updated_at` is strictly greater. Ties keep the local copy.
#[must_use]
pub fn resolve(local: Option<&Note>, remote: &Note) -> Resolution {
    match local {
        None => Resolution::TakeRemote,
        Some(local) if remote.updated_at > local.updated_at => Resolution::TakeRemote,
        Some(_) => Resolution::KeepLocal,
    }
}

/// Outcome of merging one batch into a store partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Notes the store did not hold before
    pub adopted: usize,
    /// Existing notes replaced by a newer incoming copy
    pub updated: usize,
    /// Incoming notes ignored because the stored copy was as new or newer
    pub kept_local: usize,
}

impl MergeSummary {
    /// Number of notes written
    pub const fn written(&self) -> usize {
        self.adopted + self.updated
    }
}

/// Merge `incoming` into `owner_id`'s partition using an open transaction.
///
/// Every incoming note is re-owned to `owner_id` before it is compared, so a
/// batch can never write into another partition.
pub fn merge_incoming_in(
    tx: &dyn NoteAccess,
    owner_id: &str,
    incoming: impl IntoIterator<Item = Note>,
) -> Result<MergeSummary> {
    let mut summary = MergeSummary::default();

    for mut note in incoming {
        note.owner_id = owner_id.to_string();
        let local = tx.get(owner_id, &note.id)?;

        match resolve(local.as_ref(), &note) {
            Resolution::KeepLocal => summary.kept_local += 1,
            Resolution::TakeRemote => {
                if let Some(local) = &local {
                    // Stored creation time is authoritative.
                    note.created_at = local.created_at;
                    summary.updated += 1;
                } else {
                    summary.adopted += 1;
                }
                tx.put(&note)?;
            }
        }
    }

    Ok(summary)
}

/// Merge `incoming` into `owner_id`'s partition as a single atomic transaction.
pub fn merge_incoming<S: NoteStore>(
    store: &S,
    owner_id: &str,
    incoming: Vec<Note>,
) -> Result<MergeSummary> {
    let summary = store.transaction(|tx| merge_incoming_in(tx, owner_id, incoming))?;
    tracing::debug!(
        owner = owner_id,
        adopted = summary.adopted,
        updated = summary.updated,
        kept_local = summary.kept_local,
        "Merged incoming notes"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteNoteStore;
    use crate::models::NoteId;
    use pretty_assertions::assert_eq;

    fn note_at(id: NoteId, updated_at: i64, content: &str) -> Note {
        Note {
            id,
            owner_id: "alice".to_string(),
            title: "T".to_string(),
            content: content.to_string(),
            created_at: 1,
            updated_at,
            is_encrypted: false,
        }
    }

    #[test]
    fn absent_local_takes_remote() {
        let remote = note_at(NoteId::new(), 5, "r");
        assert_eq!(resolve(None, &remote), Resolution::TakeRemote);
    }

    #[test]
    fn newer_side_wins_regardless_of_role() {
        let id = NoteId::new();
        let older = note_at(id, 100, "old");
        let newer = note_at(id, 200, "new");

        assert_eq!(resolve(Some(&older), &newer), Resolution::TakeRemote);
        assert_eq!(resolve(Some(&newer), &older), Resolution::KeepLocal);
    }

    #[test]
    fn equal_timestamps_keep_local() {
        let id = NoteId::new();
        let local = note_at(id, 100, "local");
        let remote = note_at(id, 100, "remote");
        assert_eq!(resolve(Some(&local), &remote), Resolution::KeepLocal);
    }

    #[test]
    fn merge_updates_adopts_and_keeps() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let shared = NoteId::new();
        let stale = NoteId::new();
        store.put(&note_at(shared, 100, "A")).unwrap();
        store.put(&note_at(stale, 300, "local wins")).unwrap();

        let adopted = note_at(NoteId::new(), 50, "C");
        let summary = merge_incoming(
            &store,
            "alice",
            vec![
                note_at(shared, 200, "B"),
                note_at(stale, 250, "remote loses"),
                adopted.clone(),
            ],
        )
        .unwrap();

        assert_eq!(
            summary,
            MergeSummary {
                adopted: 1,
                updated: 1,
                kept_local: 1
            }
        );
        assert_eq!(store.get("alice", &shared).unwrap().unwrap(), note_at(shared, 200, "B"));
        assert_eq!(store.get("alice", &stale).unwrap().unwrap().content, "local wins");
        assert_eq!(store.get("alice", &adopted.id).unwrap().unwrap(), adopted);
    }

    #[test]
    fn merge_forces_owner_partition() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let mut foreign = note_at(NoteId::new(), 10, "x");
        foreign.owner_id = "mallory".to_string();

        merge_incoming(&store, "alice", vec![foreign.clone()]).unwrap();

        assert!(store.get("mallory", &foreign.id).unwrap().is_none());
        assert_eq!(store.get("alice", &foreign.id).unwrap().unwrap().owner_id, "alice");
    }

    #[test]
    fn merge_keeps_stored_created_at() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let id = NoteId::new();
        store.put(&note_at(id, 100, "A")).unwrap();

        let mut remote = note_at(id, 200, "B");
        remote.created_at = 999;
        merge_incoming(&store, "alice", vec![remote]).unwrap();

        assert_eq!(store.get("alice", &id).unwrap().unwrap().created_at, 1);
    }
}
