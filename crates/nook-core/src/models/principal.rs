//! Sync principal model

use std::fmt;

/// The identity a note partition and a sync call are scoped to.
///
/// Credentials are opaque here; acquiring and verifying them happens elsewhere.
#[derive(Clone, PartialEq, Eq)]
pub enum Principal {
    /// A signed-in user with a bearer credential
    Authenticated { id: String, credential: String },
    /// A guest identified only by a locally generated id
    Guest { id: String },
}

impl Principal {
    pub fn authenticated(id: impl Into<String>, credential: impl Into<String>) -> Self {
        Self::Authenticated {
            id: id.into(),
            credential: credential.into(),
        }
    }

    pub fn guest(id: impl Into<String>) -> Self {
        Self::Guest { id: id.into() }
    }

    /// Partition key used by the note store.
    pub fn owner_id(&self) -> &str {
        match self {
            Self::Authenticated { id, .. } | Self::Guest { id } => id,
        }
    }

    /// Bearer credential, absent for guests.
    pub fn credential(&self) -> Option<&str> {
        match self {
            Self::Authenticated { credential, .. } => Some(credential),
            Self::Guest { .. } => None,
        }
    }

    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest { .. })
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated { id, .. } => formatter
                .debug_struct("Authenticated")
                .field("id", id)
                .field("credential", &"[REDACTED]")
                .finish(),
            Self::Guest { id } => formatter.debug_struct("Guest").field("id", id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_has_no_credential() {
        let guest = Principal::guest("device-1");
        assert_eq!(guest.owner_id(), "device-1");
        assert_eq!(guest.credential(), None);
        assert!(guest.is_guest());
    }

    #[test]
    fn debug_redacts_credential() {
        let user = Principal::authenticated("user-1", "secret-token");
        assert_eq!(user.credential(), Some("secret-token"));
        let debug = format!("{user:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
