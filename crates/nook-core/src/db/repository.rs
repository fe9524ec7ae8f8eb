//! Note store implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::models::{Note, NoteId, SearchHit, SearchQuery};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::Database;

const NOTE_COLUMNS: &str =
    "id, owner_id, title, content, created_at, updated_at, is_encrypted";

/// Read and write operations on notes, partitioned by owner.
///
/// Implemented both by the store itself and by the handle passed into
/// [`NoteStore::transaction`], so the same code runs inside or outside a
/// transaction.
pub trait NoteAccess {
    /// Get a note by owner and ID
    fn get(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>>;

    /// Insert or replace a full note record. `created_at` of an existing row is kept.
    fn put(&self, note: &Note) -> Result<()>;

    /// All notes of one owner, oldest first
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Note>>;

    /// Notes of one owner matching `query`, most recently updated first
    fn search(&self, owner_id: &str, query: &SearchQuery, limit: usize) -> Result<Vec<SearchHit>>;
}

/// A note store that can run a batch of reads and writes atomically.
pub trait NoteStore: NoteAccess + Send + Sync {
    /// Run `f` inside a transaction.
    ///
    /// Every write made through the handle commits together when `f` returns
    /// `Ok`; nothing is kept when it returns `Err`.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn NoteAccess) -> Result<T>;
}

/// `SQLite` implementation of `NoteAccess` over a borrowed connection
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Most recently updated notes of one owner
    pub fn list_recent(&self, owner_id: &str, limit: usize) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE owner_id = ?
             ORDER BY updated_at DESC, id ASC
             LIMIT ?"
        ))?;

        let notes = stmt
            .query_map(params![owner_id, limit as i64], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    /// Note IDs of one owner starting with `prefix`
    pub fn list_ids_by_prefix(
        &self,
        owner_id: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM notes
             WHERE owner_id = ? AND id LIKE ? ESCAPE '\\'
             ORDER BY id ASC
             LIMIT ?",
        )?;

        let pattern = format!("{}%", escape_like(prefix));
        let ids = stmt
            .query_map(params![owner_id, pattern, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let id = id
            .parse::<NoteId>()
            .map_err(|error| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(error)))?;
        Ok(Note {
            id,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            is_encrypted: row.get::<_, i32>(6)? != 0,
        })
    }
}

impl NoteAccess for SqliteNoteRepository<'_> {
    fn get(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ? AND id = ?"),
                params![owner_id, id.as_str()],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn put(&self, note: &Note) -> Result<()> {
        if note.owner_id.trim().is_empty() {
            return Err(Error::InvalidInput("note owner_id must not be empty".into()));
        }

        self.conn.execute(
            "INSERT INTO notes (id, owner_id, title, content, created_at, updated_at, is_encrypted)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(owner_id, id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                updated_at = excluded.updated_at,
                is_encrypted = excluded.is_encrypted",
            params![
                note.id.as_str(),
                note.owner_id,
                note.title,
                note.content,
                note.created_at,
                note.updated_at,
                i32::from(note.is_encrypted)
            ],
        )?;
        Ok(())
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE owner_id = ?
             ORDER BY created_at ASC, id ASC"
        ))?;

        let notes = stmt
            .query_map(params![owner_id], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn search(&self, owner_id: &str, query: &SearchQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes
             WHERE owner_id = ?
             ORDER BY updated_at DESC, id ASC"
        ))?;

        let mut hits = Vec::new();
        for note in stmt.query_map(params![owner_id], Self::parse_note)? {
            if hits.len() >= limit {
                break;
            }
            if let Some(hit) = query.hit(note?) {
                hits.push(hit);
            }
        }
        Ok(hits)
    }
}

/// Thread-safe `SQLite` note store shared by the sync engine and its callers
pub struct SqliteNoteStore {
    db: Mutex<Database>,
}

impl SqliteNoteStore {
    /// Wrap an opened database
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open a file-backed store, creating it if needed
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Most recently updated notes of one owner
    pub fn list_recent(&self, owner_id: &str, limit: usize) -> Result<Vec<Note>> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).list_recent(owner_id, limit)
    }

    /// Note IDs of one owner starting with `prefix`
    pub fn list_ids_by_prefix(
        &self,
        owner_id: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).list_ids_by_prefix(owner_id, prefix, limit)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::Database("note store lock poisoned".to_string()))
    }
}

impl NoteAccess for SqliteNoteStore {
    fn get(&self, owner_id: &str, id: &NoteId) -> Result<Option<Note>> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).get(owner_id, id)
    }

    fn put(&self, note: &Note) -> Result<()> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).put(note)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Note>> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).list_by_owner(owner_id)
    }

    fn search(&self, owner_id: &str, query: &SearchQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let db = self.lock()?;
        SqliteNoteRepository::new(db.connection()).search(owner_id, query, limit)
    }
}

impl NoteStore for SqliteNoteStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn NoteAccess) -> Result<T>,
    {
        let mut db = self.lock()?;
        let tx = db.connection_mut().transaction()?;
        // An early return drops `tx`, which rolls it back.
        let value = f(&SqliteNoteRepository::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
