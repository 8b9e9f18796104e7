//! Scripted data source for store and loader tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use agro_client::{ClientError, ClientResult, DataSource};
use agro_core::{
    fallback_snapshot, DeletedParcela, HistoricalPoint, Interval, ParcelaId, Snapshot,
};
use chrono::{TimeZone, Utc};

type Step<T> = (Duration, ClientResult<T>);

/// Replays queued responses, each after its own delay
pub struct ScriptedSource {
    snapshots: Mutex<VecDeque<Step<Snapshot>>>,
    history: Mutex<VecDeque<Step<Vec<HistoricalPoint>>>>,
    history_calls: Mutex<Vec<(Option<ParcelaId>, u32, Interval)>>,
    snapshot_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            history: Mutex::new(VecDeque::new()),
            history_calls: Mutex::new(Vec::new()),
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_snapshot(&self, delay: Duration, result: ClientResult<Snapshot>) {
        self.snapshots.lock().unwrap().push_back((delay, result));
    }

    pub fn push_history(&self, delay: Duration, result: ClientResult<Vec<HistoricalPoint>>) {
        self.history.lock().unwrap().push_back((delay, result));
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> Vec<(Option<ParcelaId>, u32, Interval)> {
        self.history_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DataSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> ClientResult<Snapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.snapshots.lock().unwrap().pop_front();
        let (delay, result) =
            step.unwrap_or((Duration::ZERO, Err(ClientError::Transport("script exhausted".into()))));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_history(
        &self,
        parcela_id: Option<ParcelaId>,
        days: u32,
        interval: Interval,
    ) -> ClientResult<Vec<HistoricalPoint>> {
        self.history_calls
            .lock()
            .unwrap()
            .push((parcela_id, days, interval));
        let step = self.history.lock().unwrap().pop_front();
        let (delay, result) = step.unwrap_or((Duration::ZERO, Ok(sample_points())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn fetch_deleted_parcelas(&self) -> ClientResult<Vec<DeletedParcela>> {
        Ok(Vec::new())
    }
}

/// A live-looking snapshot distinguishable by its aggregate temperature
pub fn live_snapshot(temperatura: f64) -> Snapshot {
    let mut snapshot = fallback_snapshot();
    snapshot.sensores.temperatura = temperatura;
    snapshot.parcelas.truncate(2);
    snapshot
}

pub fn sample_points() -> Vec<HistoricalPoint> {
    (0..3)
        .map(|h| HistoricalPoint {
            bucket: None,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 17, 12 + h, 0, 0).unwrap(),
            temperatura: 20.0 + f64::from(h),
            humedad: 60.0,
            lluvia: 0.0,
            sol: 50.0,
        })
        .collect()
}
