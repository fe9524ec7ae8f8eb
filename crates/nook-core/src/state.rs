//! Shared cross-client state types.

/// Sync state published by the orchestrator to interested clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No pass has run yet.
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

impl SyncState {
    /// Returns true once a pass has finished, successfully or not.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Synced | Self::Error)
    }
}
