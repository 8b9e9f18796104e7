//! View-models for the dashboard widgets
//!
//! Presenters are pure functions of the store state, the selection and the
//! history view. They never fetch and never fail: every input maps to a
//! loading, error, empty or data view.

pub mod analysis;
pub mod chart;
pub mod map;
pub mod tables;
pub mod weather;

pub use analysis::*;
pub use chart::*;
pub use map::*;
pub use tables::*;
pub use weather::*;

use agro_core::SelectionState;
use agro_sync::{SnapshotOrigin, StoreState, SyncStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub(crate) fn fmt_temperature(v: f64) -> String {
    format!("{:.1}°C", v)
}

pub(crate) fn fmt_humidity(v: f64) -> String {
    format!("{:.1}%", v)
}

pub(crate) fn fmt_rainfall(v: f64) -> String {
    format!("{:.1} mm", v)
}

pub(crate) fn fmt_sun(v: f64) -> String {
    format!("{:.0}%", v)
}

/// Sync status banner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub status: SyncStatus,
    pub origin: Option<SnapshotOrigin>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn status_view(state: &StoreState) -> StatusView {
    StatusView {
        status: state.status,
        origin: state.data.as_ref().map(|d| d.origin),
        error: state.error.clone(),
        updated_at: state.data.as_ref().map(|d| d.updated_at),
    }
}

/// Everything on the main dashboard page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: StatusView,
    pub selected_parcela_id: Option<i64>,
    pub weather: WeatherPanelsView,
    pub map: MapView,
}

pub fn dashboard_view(state: &StoreState, selection: &SelectionState) -> DashboardView {
    DashboardView {
        status: status_view(state),
        selected_parcela_id: selection.selected(),
        weather: weather_panels(state, selection),
        map: map_view(state.snapshot(), selection),
    }
}
