//! HTTP transport against the sync server's `POST /sync` endpoint.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use super::transport::{PulledNotes, SyncTransport, TransportError, TransportResult};
use super::wire::{decode_notes, SyncRequestBody, SyncResponseBody, WireNote};
use crate::config::SyncSettings;
use crate::models::{Note, Principal};

/// Sync transport speaking the server's JSON API.
///
/// The server answers a push with its full post-merge collection. That answer
/// is kept and handed out by the next `pull` for the same owner, so a normal
/// pass costs one request.
pub struct HttpSyncTransport {
    endpoint: String,
    client: reqwest::Client,
    pending: Mutex<Option<(String, PulledNotes)>>,
}

impl HttpSyncTransport {
    pub fn new(settings: &SyncSettings) -> TransportResult<Self> {
        let endpoint = settings.sync_endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            endpoint,
            client,
            pending: Mutex::new(None),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, principal: &Principal, notes: &[Note]) -> TransportResult<PulledNotes> {
        let body = SyncRequestBody {
            notes: notes.iter().map(WireNote::from).collect(),
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&body);
        request = match principal.credential() {
            Some(credential) => request.bearer_auth(credential),
            None => request.header("x-guest-id", principal.owner_id()),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        let payload = response.json::<SyncResponseBody<Value>>().await?;
        if !payload.success {
            return Err(TransportError::InvalidPayload(
                "server reported an unsuccessful sync".to_string(),
            ));
        }
        Ok(decode_notes(&payload.notes, principal.owner_id()))
    }
}

impl SyncTransport for HttpSyncTransport {
    async fn push(&self, principal: &Principal, notes: &[Note]) -> TransportResult<()> {
        let merged = self.exchange(principal, notes).await?;
        *self.pending.lock().await = Some((principal.owner_id().to_string(), merged));
        Ok(())
    }

    async fn pull(&self, principal: &Principal) -> TransportResult<PulledNotes> {
        let pending = self.pending.lock().await.take();
        match pending {
            Some((owner, notes)) if owner == principal.owner_id() => Ok(notes),
            _ => self.exchange(principal, &[]).await,
        }
    }
}

impl std::fmt::Debug for HttpSyncTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpSyncTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

const MAX_ERROR_MESSAGE_CHARS: usize = 180;

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return error_excerpt(&message);
        }
    }

    let trimmed = error_excerpt(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
    } else {
        trimmed
    }
}

fn error_excerpt(body: &str) -> String {
    body.trim().chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
}
