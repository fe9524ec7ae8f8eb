use std::hash::{Hash, Hasher};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use nook_core::db::{NoteAccess, SqliteNoteStore};
use nook_core::sync::merge_incoming;
use nook_core::sync::wire::{decode_notes, SyncRequestBody, SyncResponseBody, WireNote};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{resolve_owner, JwtVerifier, RequestOwner};
use crate::config::AppConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    store: Arc<SqliteNoteStore>,
    verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<SqliteNoteStore>) -> Self {
        Self {
            verifier: Arc::new(JwtVerifier::new(&config.jwt_secret, config.auth_clock_skew)),
            store,
            config,
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/sync", post(sync_notes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/health", get(health))
        .merge(protected_routes);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp(),
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let owner = resolve_owner(request.headers(), &state.verifier)?;
    request.extensions_mut().insert(owner);
    Ok(next.run(request).await)
}

/// Merge the client's notes with last-write-wins, then return every note the
/// owner has.
async fn sync_notes(
    State(state): State<AppState>,
    Extension(owner): Extension<RequestOwner>,
    payload: Result<Json<SyncRequestBody<Value>>, JsonRejection>,
) -> Result<Json<SyncResponseBody>, AppError> {
    let Json(body) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let user_hash = user_fingerprint(&owner.owner_id);
    let incoming = decode_notes(&body.notes, &owner.owner_id);
    if incoming.rejected > 0 {
        tracing::warn!(
            endpoint = "sync",
            user = user_hash,
            rejected = incoming.rejected,
            "Skipped malformed notes in sync request"
        );
    }

    let store = Arc::clone(&state.store);
    let owner_id = owner.owner_id.clone();
    let received = incoming.notes.len();
    let result = tokio::task::spawn_blocking(move || {
        let summary = merge_incoming(store.as_ref(), &owner_id, incoming.notes)?;
        let notes = store.list_by_owner(&owner_id)?;
        Ok::<_, nook_core::Error>((summary, notes))
    })
    .await
    .map_err(|error| error.to_string())
    .and_then(|result| result.map_err(|error| error.to_string()));

    let (summary, notes) = result.map_err(|error| {
        tracing::error!(endpoint = "sync", user = user_hash, %error, "Sync failed");
        AppError::internal("Failed to synchronize notes")
    })?;

    tracing::info!(
        endpoint = "sync",
        user = user_hash,
        guest = owner.is_guest,
        received,
        written = summary.written(),
        returned = notes.len(),
        "Synchronized notes"
    );
    Ok(Json(SyncResponseBody {
        success: true,
        notes: notes.iter().map(WireNote::from).collect(),
    }))
}

fn user_fingerprint(user_id: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    user_id.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use nook_core::config::SyncSettings;
    use nook_core::models::{Note, NoteId, Principal};
    use nook_core::sync::{HttpSyncTransport, SyncOrchestrator, SyncTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::auth::tests::{token_for, SECRET};

    struct TestServer {
        base_url: String,
        store: Arc<SqliteNoteStore>,
    }

    impl TestServer {
        async fn spawn() -> Self {
            let store = Arc::new(SqliteNoteStore::open_in_memory().unwrap());
            let state = AppState::new(Arc::new(AppConfig::for_tests(SECRET)), store.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app_router(state)).await.unwrap();
            });
            Self {
                base_url: format!("http://{addr}/api"),
                store,
            }
        }

        fn transport(&self) -> HttpSyncTransport {
            HttpSyncTransport::new(&SyncSettings::new(self.base_url.clone())).unwrap()
        }

        fn device(&self) -> SyncOrchestrator<SqliteNoteStore, HttpSyncTransport> {
            SyncOrchestrator::new(
                Arc::new(SqliteNoteStore::open_in_memory().unwrap()),
                self.transport(),
            )
        }

        async fn post_sync(&self, body: Value, guest_id: Option<&str>) -> reqwest::Response {
            let mut request = reqwest::Client::new()
                .post(format!("{}/sync", self.base_url))
                .json(&body);
            if let Some(guest_id) = guest_id {
                request = request.header("x-guest-id", guest_id);
            }
            request.send().await.unwrap()
        }
    }

    fn wire(note: &Note) -> Value {
        serde_json::to_value(WireNote::from(note)).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = TestServer::spawn().await;
        let body: Value = reqwest::get(format!("{}/health", server.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn sync_requires_authentication() {
        let server = TestServer::spawn().await;
        let response = server.post_sync(json!({ "notes": [] }), None).await;

        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Authentication required" }));
    }

    #[tokio::test]
    async fn push_applies_last_write_wins() {
        let server = TestServer::spawn().await;
        let id = NoteId::new();
        let mut stored = Note::new("guest_device", "T", "newer");
        stored.id = id;
        stored.updated_at = 200;
        server.store.put(&stored).unwrap();

        let mut older = stored.clone();
        older.content = "older".to_string();
        older.updated_at = 100;
        let response = server
            .post_sync(json!({ "notes": [wire(&older)] }), Some("device"))
            .await;

        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["notes"][0]["content"], "newer");
        assert_eq!(body["notes"][0]["updatedAt"], 200);
        assert_eq!(server.store.get("guest_device", &id).unwrap().unwrap(), stored);
    }

    #[tokio::test]
    async fn malformed_notes_are_skipped() {
        let server = TestServer::spawn().await;
        let good = Note::new("ignored", "Good", "");
        let response = server
            .post_sync(
                json!({ "notes": [{ "title": "no id" }, wire(&good), 42] }),
                Some("device"),
            )
            .await;

        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["notes"].as_array().unwrap().len(), 1);
        assert_eq!(body["notes"][0]["id"], good.id.to_string());
        assert!(body["notes"][0].get("ownerId").is_none());
    }

    #[tokio::test]
    async fn invalid_json_is_a_bad_request() {
        let server = TestServer::spawn().await;
        let response = reqwest::Client::new()
            .post(format!("{}/sync", server.base_url))
            .header("x-guest-id", "device")
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn two_guest_devices_converge() {
        let server = TestServer::spawn().await;
        let principal = Principal::guest("shared");
        let laptop = server.device();
        let phone = server.device();

        let note = Note::new("shared", "Alpha", "from laptop");
        laptop.store().put(&note).unwrap();
        assert!(laptop.sync(&principal).await.is_completed());

        let report = *phone.sync(&principal).await.report().unwrap();
        assert_eq!(report.adopted, 1);
        assert_eq!(phone.store().get("shared", &note.id).unwrap().unwrap(), note);

        let mut edited = note.clone();
        edited.content = "edited on phone".to_string();
        edited.touch();
        phone.store().put(&edited).unwrap();
        assert!(phone.sync(&principal).await.is_completed());

        let report = *laptop.sync(&principal).await.report().unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(laptop.store().get("shared", &note.id).unwrap().unwrap(), edited);
        let on_server = server.store.get("guest_shared", &note.id).unwrap().unwrap();
        assert_eq!(on_server.content, edited.content);
        assert_eq!(on_server.updated_at, edited.updated_at);
    }

    #[tokio::test]
    async fn authenticated_sync_uses_token_subject() {
        let server = TestServer::spawn().await;
        let principal = Principal::authenticated("user-1", token_for("user-1", 300));
        let device = server.device();
        let note = Note::new("user-1", "Alpha", "");
        device.store().put(&note).unwrap();

        assert!(device.sync(&principal).await.is_completed());

        assert!(server.store.get("user-1", &note.id).unwrap().is_some());
        assert!(server.store.list_by_owner("guest_user-1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn pull_without_push_fetches_collection() {
        let server = TestServer::spawn().await;
        let stored = Note::new("guest_device", "Stored", "");
        server.store.put(&stored).unwrap();

        let pulled = server
            .transport()
            .pull(&Principal::guest("device"))
            .await
            .unwrap();

        assert_eq!(pulled.rejected, 0);
        assert_eq!(pulled.notes.len(), 1);
        assert_eq!(pulled.notes[0].id, stored.id);
        assert_eq!(pulled.notes[0].owner_id, "device");
    }

    #[tokio::test]
    async fn rejected_token_surfaces_as_api_error() {
        let server = TestServer::spawn().await;
        let principal = Principal::authenticated("user-1", "not-a-token");

        let error = server.transport().pull(&principal).await.unwrap_err();

        assert!(matches!(
            error,
            nook_core::sync::TransportError::Api { status: 401, ref message }
                if message == "Invalid authentication token"
        ));
    }
}
