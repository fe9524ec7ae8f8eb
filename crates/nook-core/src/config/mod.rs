//! Client-side sync configuration.
//!
//! `SyncSettings` is the piece of a client profile the sync transports need.
//! Profiles themselves are stored by the client binaries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sync::{TransportError, TransportResult};

/// Default request timeout for sync calls
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 15;

const MAX_SYNC_TIMEOUT_SECS: u64 = 300;

/// Where and how a client reaches its sync server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSettings {
    /// Base URL of the sync API, e.g. `https://notes.example.com/api`
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
        }
    }
}

impl SyncSettings {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: Some(api_base_url.into()),
            ..Self::default()
        }
    }

    /// Base URL without trailing slashes.
    ///
    /// Fails when no URL is configured or it is not `http(s)://`.
    pub fn base_url(&self) -> TransportResult<String> {
        let url = self
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                TransportError::InvalidConfiguration("api_base_url is not configured".to_string())
            })?;
        normalize_api_base_url(url)
    }

    /// Full URL of the `POST /sync` endpoint
    pub fn sync_endpoint(&self) -> TransportResult<String> {
        Ok(format!("{}/sync", self.base_url()?))
    }

    /// Request timeout, clamped to `1..=300` seconds
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(1, MAX_SYNC_TIMEOUT_SECS))
    }
}

/// Trim `url` and its trailing slashes, requiring an `http://` or `https://` scheme.
pub fn normalize_api_base_url(url: &str) -> TransportResult<String> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(TransportError::InvalidConfiguration(
            "api_base_url must include http:// or https://".to_string(),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_SYNC_TIMEOUT_SECS
}
