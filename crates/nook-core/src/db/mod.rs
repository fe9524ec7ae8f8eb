//! Database layer for Nook

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{NoteAccess, NoteStore, SqliteNoteRepository, SqliteNoteStore};
