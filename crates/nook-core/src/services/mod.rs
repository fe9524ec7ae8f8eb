//! Application services shared by the clients.

mod notebook;

pub use notebook::{Notebook, NoteUpdate, UpdatedNote};
