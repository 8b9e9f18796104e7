//! Snapshot store: the refresh state machine

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agro_client::{ClientResult, DataSource};
use agro_core::{fallback_snapshot, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message shown when the snapshot could not be refreshed
pub const FETCH_ERROR_MESSAGE: &str = "Error al cargar los datos. Por favor, intenta de nuevo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created, polling not started
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Where the visible snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Live,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreData {
    pub snapshot: Arc<Snapshot>,
    pub origin: SnapshotOrigin,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    pub status: SyncStatus,
    /// None until the first refresh completes
    pub data: Option<StoreData>,
    pub error: Option<String>,
    /// Sequence number of the last response applied
    pub applied_seq: u64,
}

impl StoreState {
    fn idle() -> Self {
        Self {
            status: SyncStatus::Idle,
            data: None,
            error: None,
            applied_seq: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.data.as_ref().map(|d| d.snapshot.as_ref())
    }

    pub fn is_loading(&self) -> bool {
        self.status == SyncStatus::Loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was applied and left the store in this status
    Applied(SyncStatus),
    /// A response from a later request was already applied
    Superseded,
    /// The store was shut down before the response arrived
    Cancelled,
}

/// Holds the latest snapshot and drives its refresh
///
/// Refreshes may overlap. Every request takes a sequence number and a
/// response is applied only if no later request has been applied first, so a
/// slow old response never overwrites a newer one.
pub struct SyncStore {
    source: Arc<dyn DataSource>,
    fallback: Arc<Snapshot>,
    state: watch::Sender<StoreState>,
    next_seq: AtomicU64,
    cancel: CancellationToken,
}

impl SyncStore {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self::with_fallback(source, fallback_snapshot())
    }

    pub fn with_fallback(source: Arc<dyn DataSource>, fallback: Snapshot) -> Self {
        let (state, _) = watch::channel(StoreState::idle());
        Self {
            source,
            fallback: Arc::new(fallback),
            state,
            next_seq: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Current state (cloned)
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Fetch a snapshot and apply it, or apply the failure
    pub async fn refresh(&self) -> RefreshOutcome {
        if self.cancel.is_cancelled() {
            return RefreshOutcome::Cancelled;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.status = SyncStatus::Loading);
        debug!(seq, "snapshot refresh started");

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(seq, "snapshot refresh cancelled");
                return RefreshOutcome::Cancelled;
            }
            result = self.source.fetch_snapshot() => result,
        };

        self.apply(seq, result)
    }

    fn apply(&self, seq: u64, result: ClientResult<Snapshot>) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::Superseded;
        let fallback = &self.fallback;
        let cancel = &self.cancel;

        self.state.send_if_modified(|state| {
            if cancel.is_cancelled() {
                outcome = RefreshOutcome::Cancelled;
                return false;
            }
            if seq <= state.applied_seq {
                debug!(seq, applied = state.applied_seq, "discarding superseded snapshot response");
                return false;
            }
            state.applied_seq = seq;

            match result {
                Ok(snapshot) => {
                    info!(seq, parcelas = snapshot.parcelas.len(), "snapshot refreshed");
                    state.status = SyncStatus::Ready;
                    state.error = None;
                    state.data = Some(StoreData {
                        snapshot: Arc::new(snapshot),
                        origin: SnapshotOrigin::Live,
                        updated_at: Utc::now(),
                    });
                }
                Err(e) => {
                    state.status = SyncStatus::Failed;
                    state.error = Some(FETCH_ERROR_MESSAGE.to_string());
                    let has_live = matches!(
                        state.data,
                        Some(StoreData { origin: SnapshotOrigin::Live, .. })
                    );
                    if has_live {
                        warn!(seq, error = %e, "snapshot refresh failed, keeping last snapshot");
                    } else {
                        warn!(seq, error = %e, "snapshot refresh failed, using fallback data");
                        state.data = Some(StoreData {
                            snapshot: Arc::clone(fallback),
                            origin: SnapshotOrigin::Fallback,
                            updated_at: Utc::now(),
                        });
                    }
                }
            }
            outcome = RefreshOutcome::Applied(state.status);
            true
        });

        outcome
    }

    /// Start polling: one refresh immediately, then one per `period`
    ///
    /// Each tick runs its refresh as a separate task, so a slow request does
    /// not hold back the next tick.
    pub fn start(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        self.state.send_if_modified(|s| {
            if s.status == SyncStatus::Idle {
                s.status = SyncStatus::Loading;
                true
            } else {
                false
            }
        });

        let store = Arc::clone(self);
        info!(period_secs = period.as_secs(), "snapshot polling started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = store.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let store = Arc::clone(&store);
                        tokio::spawn(async move {
                            store.refresh().await;
                        });
                    }
                }
            }
            info!("snapshot polling stopped");
        })
    }

    /// Stop polling and abandon in-flight requests
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("shutting down snapshot store");
            self.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
