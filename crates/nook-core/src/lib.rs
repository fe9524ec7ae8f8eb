//! nook-core - Core library for Nook
//!
//! This crate contains the note model, the on-device note store, the link
//! rewriter, and the sync engine shared by the CLI and the sync server.

pub mod config;
pub mod db;
pub mod error;
pub mod links;
pub mod models;
pub mod services;
pub mod state;
pub mod sync;

pub use error::{Error, Result};
pub use models::{Note, NoteId, Principal};
pub use state::SyncState;
