//! AgroIoT dashboard daemon
//!
//! Owns the snapshot store, the history loader, the parcela selection and the
//! session flag, and serves the widget view-models over HTTP.

pub mod presenters;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use agro_client::DataSource;
use agro_core::{ParcelaId, ParseRangeError, RangeKey, SelectionState};
use agro_sync::{HistoryLoader, HistoryState, HistoryView, RefreshOutcome, SyncStore};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use opentelemetry::metrics::{Counter, MeterProvider};
use opentelemetry::KeyValue;
use opentelemetry_prometheus::exporter;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::presenters::{
    analysis_view, chart_view, dashboard_view, deleted_parcelas_view, parcelas_table, status_view,
    ChartMetric,
};
use crate::session::{Session, SessionError};

pub struct AppState {
    registry: Registry,
    #[allow(dead_code)]
    provider: SdkMeterProvider,
    requests_total: Counter<u64>,
    store: Arc<SyncStore>,
    history: Arc<HistoryLoader>,
    source: Arc<dyn DataSource>,
    selection: Mutex<SelectionState>,
    session: Session,
}

impl AppState {
    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    pub fn history(&self) -> &Arc<HistoryLoader> {
        &self.history
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn count(&self, route: &'static str) {
        self.requests_total.add(1, &[KeyValue::new("route", route)]);
    }
}

/// Errors returned by the JSON handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    InvalidRange(#[from] ParseRangeError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("store is shut down")]
    ShutDown,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ShutDown => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub fn build_app(source: Arc<dyn DataSource>, session: Session) -> Result<(Router, Arc<AppState>)> {
    // Prometheus exporter via OpenTelemetry
    let registry = Registry::new();
    let reader = exporter()
        .with_registry(registry.clone())
        .build()
        .context("building prometheus exporter")?;
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    let meter = provider.meter("agro-dashboard");

    let requests_total = meter
        .u64_counter("agro_requests_total")
        .with_description("Total HTTP requests served")
        .init();

    let state = Arc::new(AppState {
        registry,
        provider,
        requests_total,
        store: Arc::new(SyncStore::new(Arc::clone(&source))),
        history: Arc::new(HistoryLoader::new(Arc::clone(&source))),
        source,
        selection: Mutex::new(SelectionState::new()),
        session,
    });

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/dashboard", get(dashboard))
        .route("/api/v1/parcelas", get(parcelas))
        .route("/api/v1/parcelas/deleted", get(deleted_parcelas))
        .route("/api/v1/selection", put(select_parcela))
        .route("/api/v1/refresh", post(refresh))
        .route("/api/v1/history", get(history))
        .route("/api/v1/history/range", put(set_history_range))
        .route("/api/v1/analysis", get(analysis))
        .route(
            "/api/v1/session",
            get(session_status).post(login).delete(logout),
        )
        .with_state(Arc::clone(&state));

    Ok((router, state))
}

/// Start the snapshot poller and the history loader
pub fn start_sync(
    state: &Arc<AppState>,
    refresh_period: Duration,
    history_refresh: Duration,
) -> Vec<JoinHandle<()>> {
    vec![
        state.store.start(refresh_period),
        state.history.start(history_refresh),
    ]
}

/// Cancel timers and in-flight requests
pub fn shutdown(state: &Arc<AppState>) {
    state.store.shutdown();
    state.history.shutdown();
}

async fn healthz(State(state): State<Arc<AppState>>) -> StatusCode {
    state.count("healthz");
    StatusCode::OK
}

/// Ready once a snapshot (live or fallback) has been applied
async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.store.state().data.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics(
    State(state): State<Arc<AppState>>,
) -> (
    [(axum::http::header::HeaderName, axum::http::HeaderValue); 1],
    String,
) {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::warn!(error=?e, "failed to encode metrics");
    }
    let body = String::from_utf8(buf).unwrap_or_default();
    let header = (
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    ([header], body)
}

async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("dashboard");
    let store = state.store.state();
    let selection = state.selection.lock().await;
    Json(dashboard_view(&store, &selection))
}

async fn parcelas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("parcelas");
    Json(parcelas_table(&state.store.state()))
}

async fn deleted_parcelas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("parcelas_deleted");
    let result = state.source.fetch_deleted_parcelas().await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "failed to fetch deleted parcelas");
    }
    Json(deleted_parcelas_view(&result))
}

#[derive(Debug, Deserialize)]
struct SelectionBody {
    #[serde(rename = "parcelaId")]
    parcela_id: Option<ParcelaId>,
}

async fn select_parcela(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionBody>,
) -> impl IntoResponse {
    state.count("selection");
    let mut selection = state.selection.lock().await;
    selection.select(body.parcela_id);
    state.history.set_parcela(body.parcela_id);
    tracing::debug!(parcela_id = ?body.parcela_id, "selection changed");
    Json(dashboard_view(&state.store.state(), &selection))
}

async fn refresh(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.count("refresh");
    match state.store.refresh().await {
        RefreshOutcome::Cancelled => Err(ApiError::ShutDown),
        _ => Ok(Json(status_view(&state.store.state()))),
    }
}

#[derive(Debug, Deserialize)]
struct RangeBody {
    range: String,
}

async fn set_history_range(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RangeBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.count("history_range");
    let range: RangeKey = body.range.parse()?;
    state.history.set_range(range);
    tracing::debug!(%range, "history range changed");
    Ok(Json(chart_view(
        &current_history(&state),
        state.store.state().snapshot(),
        ChartMetric::default(),
    )))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    metric: Option<ChartMetric>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    state.count("history");
    let store = state.store.state();
    Json(chart_view(
        &current_history(&state),
        store.snapshot(),
        params.metric.unwrap_or_default(),
    ))
}

async fn analysis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("analysis");
    let store = state.store.state();
    Json(analysis_view(&current_history(&state), store.snapshot()))
}

/// Loader view, shown as loading until it has picked up the latest query
fn current_history(state: &AppState) -> HistoryView {
    let query = state.history.query();
    let view = state.history.view();
    if view.query == query {
        view
    } else {
        HistoryView {
            query,
            state: HistoryState::Loading,
        }
    }
}

fn session_body(session: &Session) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "authenticated": session.is_authenticated() }))
}

async fn session_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.count("session");
    session_body(&state.session)
}

async fn login(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.count("session");
    state.session.login()?;
    Ok(session_body(&state.session))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.count("session");
    state.session.invalidate()?;
    Ok(session_body(&state.session))
}
