//! Sync orchestrator: one push → pull → merge pass at a time.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::resolver::merge_incoming;
use super::transport::SyncTransport;
use crate::db::NoteStore;
use crate::error::Error;
use crate::models::Principal;
use crate::state::SyncState;

/// Counters of one completed sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local notes sent to the remote
    pub pushed: usize,
    /// Well-formed notes received from the remote
    pub pulled: usize,
    /// Remote notes new to this device
    pub adopted: usize,
    /// Local notes replaced by a newer remote copy
    pub updated: usize,
    /// Remote notes ignored because the local copy was as new or newer
    pub kept_local: usize,
    /// Malformed remote records skipped
    pub rejected: usize,
}

/// Result of a call to [`SyncOrchestrator::sync`]
#[derive(Debug)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another pass was already in flight on this orchestrator
    Skipped,
    /// The pass stopped early; the local store is as it was before the merge step
    Failed(Error),
}

impl SyncOutcome {
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped | Self::Failed(_) => None,
        }
    }

    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Drives sync passes between a local store and a transport.
///
/// At most one pass runs per instance. A `sync` call made while a pass is in
/// flight returns [`SyncOutcome::Skipped`] at once instead of queueing.
pub struct SyncOrchestrator<S, T> {
    store: Arc<S>,
    transport: T,
    in_flight: AtomicBool,
    state_tx: watch::Sender<SyncState>,
}

impl<S: NoteStore, T: SyncTransport> SyncOrchestrator<S, T> {
    pub fn new(store: Arc<S>, transport: T) -> Self {
        let (state_tx, _) = watch::channel(SyncState::Idle);
        Self {
            store,
            transport,
            in_flight: AtomicBool::new(false),
            state_tx,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Latest published state
    pub fn state(&self) -> SyncState {
        *self.state_tx.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state_tx.subscribe()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one sync pass for `principal`.
    ///
    /// Never returns an error: transport and store failures are logged and
    /// reported as [`SyncOutcome::Failed`].
    pub async fn sync(&self, principal: &Principal) -> SyncOutcome {
        let Some(mut guard) = PassGuard::acquire(&self.in_flight, &self.state_tx) else {
            tracing::debug!(owner = principal.owner_id(), "Sync already in flight, skipping");
            return SyncOutcome::Skipped;
        };

        match self.run_pass(principal).await {
            Ok(report) => {
                tracing::info!(
                    owner = principal.owner_id(),
                    pushed = report.pushed,
                    pulled = report.pulled,
                    adopted = report.adopted,
                    updated = report.updated,
                    kept_local = report.kept_local,
                    rejected = report.rejected,
                    "Sync pass completed"
                );
                guard.settle(SyncState::Synced);
                SyncOutcome::Completed(report)
            }
            Err(error) => {
                match &error {
                    Error::Transport(_) => {
                        tracing::warn!(owner = principal.owner_id(), %error, "Sync pass failed");
                    }
                    _ => {
                        tracing::error!(owner = principal.owner_id(), %error, "Sync pass failed");
                    }
                }
                guard.settle(SyncState::Error);
                SyncOutcome::Failed(error)
            }
        }
    }

    /// Call [`Self::sync`] every `period` until `shutdown` resolves.
    ///
    /// The first pass starts immediately. Ticks missed while a pass runs are
    /// dropped, not replayed.
    pub async fn run_periodic<F>(&self, principal: &Principal, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                () = &mut shutdown => break,
                _ = self.sync(principal) => {}
            }
        }
        tracing::debug!(owner = principal.owner_id(), "Periodic sync stopped");
    }

    async fn run_pass(&self, principal: &Principal) -> crate::Result<SyncReport> {
        let owner_id = principal.owner_id();

        let local = self.store.list_by_owner(owner_id)?;
        tracing::debug!(owner = owner_id, notes = local.len(), "Pushing local notes");
        self.transport.push(principal, &local).await?;

        let pulled = self.transport.pull(principal).await?;
        tracing::debug!(
            owner = owner_id,
            notes = pulled.notes.len(),
            rejected = pulled.rejected,
            "Pulled remote notes"
        );

        let mut report = SyncReport {
            pushed: local.len(),
            pulled: pulled.notes.len(),
            rejected: pulled.rejected,
            ..SyncReport::default()
        };

        // Local copies are re-read inside the merge transaction, so edits
        // made while the network calls were pending are compared, not lost.
        let merged = merge_incoming(self.store.as_ref(), owner_id, pulled.notes)?;
        report.adopted = merged.adopted;
        report.updated = merged.updated;
        report.kept_local = merged.kept_local;
        Ok(report)
    }
}

/// Holds the in-flight flag for one pass and publishes `Syncing` while held.
///
/// On drop the flag is cleared. A pass dropped before it settled (a cancelled
/// future) publishes `Idle`.
struct PassGuard<'a> {
    flag: &'a AtomicBool,
    state_tx: &'a watch::Sender<SyncState>,
    settled: bool,
}

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool, state_tx: &'a watch::Sender<SyncState>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        state_tx.send_replace(SyncState::Syncing);
        Some(Self {
            flag,
            state_tx,
            settled: false,
        })
    }

    fn settle(&mut self, state: SyncState) {
        self.state_tx.send_replace(state);
        self.settled = true;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.state_tx.send_replace(SyncState::Idle);
        }
        self.flag.store(false, Ordering::Release);
    }
}
