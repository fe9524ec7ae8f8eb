//! Data models for Nook

mod note;
mod principal;
mod search;
pub mod timestamp;

pub use note::{Note, NoteId};
pub use principal::Principal;
pub use search::{SearchHit, SearchQuery};
