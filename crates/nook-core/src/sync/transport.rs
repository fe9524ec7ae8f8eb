//! Transport abstraction between the orchestrator and a remote authority.

use std::future::Future;

use thiserror::Error;

use crate::models::{Note, Principal};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid sync payload: {0}")]
    InvalidPayload(String),
    #[error("Remote storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Remote storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Notes pulled from a remote, after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulledNotes {
    /// Well-formed notes, owned by the pulling principal
    pub notes: Vec<Note>,
    /// Records skipped because required fields were missing or invalid
    pub rejected: usize,
}

/// Pushes and pulls whole note collections for one principal.
///
/// Implementations must apply last-write-wins on push: a pushed note older
/// than the copy the remote already holds for that id must not replace it.
pub trait SyncTransport: Send + Sync {
    /// Send every local note of the principal to the remote.
    fn push(
        &self,
        principal: &Principal,
        notes: &[Note],
    ) -> impl Future<Output = TransportResult<()>> + Send;

    /// Fetch the remote's full, post-merge collection for the principal.
    fn pull(&self, principal: &Principal)
        -> impl Future<Output = TransportResult<PulledNotes>> + Send;
}
