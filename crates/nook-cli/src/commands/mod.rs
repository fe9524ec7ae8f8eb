pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod edit;
pub mod links;
pub mod list;
pub mod rename;
pub mod search;
pub mod show;
pub mod sync;
