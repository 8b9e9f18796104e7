//! Historical series loader for the chart

use std::sync::Arc;
use std::time::Duration;

use agro_client::{ClientResult, DataSource};
use agro_core::{HistoricalPoint, ParcelaId, RangeKey};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message shown when a series could not be loaded
pub const HISTORY_ERROR_MESSAGE: &str =
    "No se pudieron cargar los datos históricos. Intente de nuevo más tarde.";

/// What the chart is showing: one parcela (or the aggregate) over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryQuery {
    pub parcela_id: Option<ParcelaId>,
    pub range: RangeKey,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    /// Loader not started
    Idle,
    Loading,
    Ready(Vec<HistoricalPoint>),
    /// The query succeeded with zero points
    Empty,
    /// The query failed; previous points are not kept
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub query: HistoryQuery,
    pub state: HistoryState,
}

enum Reload {
    Applied,
    Superseded,
    Cancelled,
}

/// Keeps a historical series in step with the selected parcela and window
///
/// Changing the query triggers a reload. The 24h window is also reloaded on
/// a timer; longer windows stay as loaded until the query changes. Failures
/// are surfaced as [`HistoryState::Failed`] rather than papered over.
pub struct HistoryLoader {
    source: Arc<dyn DataSource>,
    query: watch::Sender<HistoryQuery>,
    view: watch::Sender<HistoryView>,
    cancel: CancellationToken,
}

impl HistoryLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        let initial = HistoryQuery::default();
        let (query, _) = watch::channel(initial);
        let (view, _) = watch::channel(HistoryView {
            query: initial,
            state: HistoryState::Idle,
        });
        Self {
            source,
            query,
            view,
            cancel: CancellationToken::new(),
        }
    }

    /// One-shot load, bypassing the published state
    pub async fn load(
        &self,
        parcela_id: Option<ParcelaId>,
        range: RangeKey,
    ) -> ClientResult<Vec<HistoricalPoint>> {
        let (days, interval) = range.query();
        self.source.fetch_history(parcela_id, days, interval).await
    }

    pub fn query(&self) -> HistoryQuery {
        *self.query.borrow()
    }

    /// Retarget the loader; a no-op if nothing changed
    pub fn set_query(&self, next: HistoryQuery) {
        self.query.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!(?next, "history query changed");
                *current = next;
                true
            }
        });
    }

    pub fn set_parcela(&self, parcela_id: Option<ParcelaId>) {
        self.set_query(HistoryQuery {
            parcela_id,
            ..self.query()
        });
    }

    pub fn set_range(&self, range: RangeKey) {
        self.set_query(HistoryQuery {
            range,
            ..self.query()
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> HistoryView {
        self.view.borrow().clone()
    }

    /// Run the loader until shutdown
    ///
    /// A query change while a fetch is in flight drops that fetch and starts
    /// the new one right away.
    pub fn start(self: &Arc<Self>, auto_refresh: Duration) -> JoinHandle<()> {
        let loader = Arc::clone(self);
        info!(auto_refresh_secs = auto_refresh.as_secs(), "history loader started");
        tokio::spawn(async move {
            let mut query_rx = loader.query.subscribe();
            let mut query = *query_rx.borrow_and_update();
            loop {
                match loader.reload(query, &mut query_rx).await {
                    Reload::Cancelled => break,
                    Reload::Superseded => {
                        query = *query_rx.borrow_and_update();
                        continue;
                    }
                    Reload::Applied => {}
                }

                tokio::select! {
                    _ = loader.cancel.cancelled() => break,
                    changed = query_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        query = *query_rx.borrow_and_update();
                    }
                    _ = tokio::time::sleep(auto_refresh), if query.range.auto_refresh() => {
                        debug!(range = %query.range, "auto-refreshing history");
                    }
                }
            }
            info!("history loader stopped");
        })
    }

    async fn reload(
        &self,
        query: HistoryQuery,
        query_rx: &mut watch::Receiver<HistoryQuery>,
    ) -> Reload {
        self.view.send_modify(|v| {
            v.query = query;
            v.state = HistoryState::Loading;
        });

        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Reload::Cancelled,
            changed = query_rx.changed() => {
                if changed.is_err() {
                    return Reload::Cancelled;
                }
                debug!(?query, "dropping history request for superseded query");
                return Reload::Superseded;
            }
            result = self.load(query.parcela_id, query.range) => result,
        };

        if self.query() != query {
            debug!(?query, "discarding history for superseded query");
            return Reload::Superseded;
        }

        let state = match result {
            Ok(points) if points.is_empty() => HistoryState::Empty,
            Ok(points) => {
                debug!(points = points.len(), range = %query.range, "history loaded");
                HistoryState::Ready(points)
            }
            Err(e) => {
                warn!(error = %e, ?query, "history load failed");
                HistoryState::Failed(HISTORY_ERROR_MESSAGE.to_string())
            }
        };
        self.view.send_modify(|v| v.state = state);
        Reload::Applied
    }

    /// Stop the loader and abandon any in-flight request
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_points, ScriptedSource};
    use agro_client::ClientError;
    use agro_core::Interval;

    fn loader(source: &Arc<ScriptedSource>) -> Arc<HistoryLoader> {
        Arc::new(HistoryLoader::new(Arc::clone(source) as Arc<dyn DataSource>))
    }

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_load_uses_range_table() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(&source);

        loader.load(None, RangeKey::Last24h).await.unwrap();
        loader.load(Some(3), RangeKey::Last7d).await.unwrap();
        loader.load(Some(3), RangeKey::Last30d).await.unwrap();
        loader.load(None, RangeKey::Last90d).await.unwrap();

        assert_eq!(
            source.history_calls(),
            vec![
                (None, 1, Interval::Hour),
                (Some(3), 7, Interval::Hour),
                (Some(3), 30, Interval::Day),
                (None, 90, Interval::Day),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reloads_on_query_change() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(&source);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        rx.wait_for(|v| matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        assert_eq!(loader.view().state, HistoryState::Ready(sample_points()));

        loader.set_parcela(Some(7));
        rx.wait_for(|v| v.query.parcela_id == Some(7) && matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();

        loader.set_range(RangeKey::Last30d);
        rx.wait_for(|v| v.query.range == RangeKey::Last30d && matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();

        assert_eq!(
            source.history_calls(),
            vec![
                (None, 1, Interval::Hour),
                (Some(7), 1, Interval::Hour),
                (Some(7), 30, Interval::Day),
            ]
        );

        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_query_does_not_reload() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(&source);
        loader.set_range(RangeKey::Last7d);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        rx.wait_for(|v| matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        loader.set_range(RangeKey::Last7d);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(source.history_calls().len(), 1);
        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_24h_window_auto_refreshes() {
        let source = Arc::new(ScriptedSource::new());
        let loader = loader(&source);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        rx.wait_for(|v| matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        assert_eq!(source.history_calls().len(), 1);

        tokio::time::sleep(FIVE_MINUTES + Duration::from_secs(1)).await;
        assert_eq!(source.history_calls().len(), 2);

        loader.set_range(RangeKey::Last90d);
        rx.wait_for(|v| v.query.range == RangeKey::Last90d && matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        assert_eq!(source.history_calls().len(), 3);

        tokio::time::sleep(FIVE_MINUTES * 3).await;
        assert_eq!(source.history_calls().len(), 3);

        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_visible() {
        let source = Arc::new(ScriptedSource::new());
        source.push_history(Duration::ZERO, Ok(sample_points()));
        source.push_history(Duration::ZERO, Err(ClientError::Transport("HTTP 500".into())));
        let loader = loader(&source);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        rx.wait_for(|v| matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        loader.set_range(RangeKey::Last7d);
        let view = rx
            .wait_for(|v| matches!(v.state, HistoryState::Failed(_)))
            .await
            .unwrap()
            .clone();

        assert_eq!(
            view.state,
            HistoryState::Failed(HISTORY_ERROR_MESSAGE.to_string())
        );
        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_series_is_not_an_error() {
        let source = Arc::new(ScriptedSource::new());
        source.push_history(Duration::ZERO, Ok(Vec::new()));
        let loader = loader(&source);
        loader.set_parcela(Some(7));
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        rx.wait_for(|v| v.state == HistoryState::Empty).await.unwrap();
        assert_eq!(source.history_calls(), vec![(Some(7), 1, Interval::Hour)]);

        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_result_is_discarded() {
        let source = Arc::new(ScriptedSource::new());
        source.push_history(Duration::from_secs(5), Err(ClientError::Transport("slow".into())));
        let loader = loader(&source);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        tokio::time::sleep(Duration::from_secs(1)).await;
        loader.set_range(RangeKey::Last30d);

        rx.wait_for(|v| v.query.range == RangeKey::Last30d && matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap();
        // The slow failure for the 24h query never reached the view
        assert!(!matches!(loader.view().state, HistoryState::Failed(_)));

        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_change_does_not_wait_for_slow_request() {
        let source = Arc::new(ScriptedSource::new());
        source.push_history(Duration::from_secs(10), Ok(sample_points()));
        let loader = loader(&source);
        let mut rx = loader.subscribe();
        let handle = loader.start(FIVE_MINUTES);

        tokio::time::sleep(Duration::from_secs(1)).await;
        loader.set_range(RangeKey::Last30d);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            source.history_calls(),
            vec![(None, 1, Interval::Hour), (None, 30, Interval::Day)]
        );
        let view = rx
            .wait_for(|v| matches!(v.state, HistoryState::Ready(_)))
            .await
            .unwrap()
            .clone();
        assert_eq!(view.query.range, RangeKey::Last30d);

        loader.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_request() {
        let source = Arc::new(ScriptedSource::new());
        source.push_history(Duration::from_secs(10), Ok(sample_points()));
        let loader = loader(&source);
        let handle = loader.start(FIVE_MINUTES);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(loader.view().state, HistoryState::Loading);

        loader.shutdown();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(loader.view().state, HistoryState::Loading);
        assert_eq!(source.history_calls().len(), 1);
    }
}
