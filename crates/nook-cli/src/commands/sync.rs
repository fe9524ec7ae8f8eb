use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use nook_core::db::SqliteNoteStore;
use nook_core::sync::{
    DocumentStoreTransport, HttpSyncTransport, PulledNotes, SyncOrchestrator, SyncOutcome,
    SyncReport, SyncTransport, TransportResult,
};
use nook_core::{Note, Principal, SyncState};

use crate::commands::common::{open_store, resolve_sync_target, Session, SyncTarget};
use crate::error::CliError;

type ProfileOrchestrator = SyncOrchestrator<SqliteNoteStore, ProfileTransport>;

/// Transport selected by the session's profile
#[derive(Debug)]
pub enum ProfileTransport {
    Server(HttpSyncTransport),
    Directory(DocumentStoreTransport),
}

impl ProfileTransport {
    pub fn from_target(target: &SyncTarget) -> Result<Self, CliError> {
        Ok(match target {
            SyncTarget::Server(settings) => Self::Server(HttpSyncTransport::new(settings)?),
            SyncTarget::Directory(root) => Self::Directory(DocumentStoreTransport::new(root)),
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Server(transport) => transport.endpoint().to_string(),
            Self::Directory(transport) => transport.root().display().to_string(),
        }
    }
}

impl SyncTransport for ProfileTransport {
    async fn push(&self, principal: &Principal, notes: &[Note]) -> TransportResult<()> {
        match self {
            Self::Server(transport) => transport.push(principal, notes).await,
            Self::Directory(transport) => transport.push(principal, notes).await,
        }
    }

    async fn pull(&self, principal: &Principal) -> TransportResult<PulledNotes> {
        match self {
            Self::Server(transport) => transport.pull(principal).await,
            Self::Directory(transport) => transport.pull(principal).await,
        }
    }
}

pub async fn run_sync(session: &Session, db_path: &Path) -> Result<(), CliError> {
    let orchestrator = build_orchestrator(session, db_path)?;

    match orchestrator.sync(&session.principal).await {
        SyncOutcome::Completed(report) => {
            println!("{}", format_sync_report(&report));
            Ok(())
        }
        SyncOutcome::Skipped => {
            println!("Sync already in progress");
            Ok(())
        }
        SyncOutcome::Failed(error) => Err(CliError::SyncFailed(error)),
    }
}

/// Sync every `interval_secs` until Ctrl+C, printing the result of each pass.
pub async fn run_sync_watch(
    session: &Session,
    interval_secs: u64,
    db_path: &Path,
) -> Result<(), CliError> {
    let orchestrator = build_orchestrator(session, db_path)?;
    let mut states = orchestrator.subscribe();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            if !state.is_settled() {
                continue;
            }
            eprintln!("[{}] {}", Local::now().format("%H:%M:%S"), sync_state_label(state));
        }
    });

    eprintln!(
        "Syncing every {interval_secs}s via {}. Press Ctrl+C to stop.",
        orchestrator.transport().describe()
    );
    orchestrator
        .run_periodic(
            &session.principal,
            Duration::from_secs(interval_secs),
            shutdown_signal(),
        )
        .await;

    drop(orchestrator);
    let _ = watcher.await;
    Ok(())
}

fn build_orchestrator(session: &Session, db_path: &Path) -> Result<ProfileOrchestrator, CliError> {
    let transport = ProfileTransport::from_target(&resolve_sync_target(session)?)?;
    let store = Arc::new(open_store(db_path)?);
    tracing::debug!(
        profile = %session.profile_name,
        remote = %transport.describe(),
        guest = session.principal.is_guest(),
        "Sync transport ready"
    );
    Ok(SyncOrchestrator::new(store, transport))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {error}");
        std::future::pending::<()>().await;
    }
}

pub const fn sync_state_label(state: SyncState) -> &'static str {
    match state {
        SyncState::Idle => "idle",
        SyncState::Syncing => "syncing",
        SyncState::Synced => "synced",
        SyncState::Error => "sync failed",
    }
}

pub fn format_sync_report(report: &SyncReport) -> String {
    let mut summary = format!(
        "Sync completed: pushed {}, pulled {} ({} new, {} updated, {} kept local)",
        report.pushed, report.pulled, report.adopted, report.updated, report.kept_local
    );
    if report.rejected > 0 {
        summary.push_str(&format!(", skipped {} malformed", report.rejected));
    }
    summary
}
