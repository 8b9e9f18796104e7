//! Analysis page: one series drawn as a trend line, a rainfall bar chart and
//! a radar of the latest readings

use agro_core::{HistoricalPoint, RangeKey, Snapshot};
use agro_sync::{HistoryState, HistoryView};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ChartMetric;

pub const ANALYSIS_LOADING_MESSAGE: &str = "Cargando datos...";
pub const ANALYSIS_EMPTY_MESSAGE: &str = "No hay datos disponibles";

/// Points compared on the radar chart
pub const RADAR_POINTS: usize = 5;

const RADAR_AXES: [&str; 4] = ["Temperatura", "Humedad", "Lluvia", "Sol"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub color: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesChart {
    pub title: &'static str,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum AnalysisBody {
    Loading {
        message: String,
    },
    Error {
        message: String,
    },
    Empty {
        message: String,
    },
    Charts {
        trend: SeriesChart,
        rainfall: SeriesChart,
        factors: SeriesChart,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub title: String,
    pub range: RangeKey,
    pub body: AnalysisBody,
}

pub fn analysis_view(history: &HistoryView, snapshot: Option<&Snapshot>) -> AnalysisView {
    let query = history.query;
    let title = match query.parcela_id {
        None => "Visualización general".to_string(),
        Some(id) => {
            let name = snapshot
                .and_then(|s| s.parcela(id))
                .map(|p| p.nombre.clone())
                .unwrap_or_else(|| format!("Parcela {}", id));
            format!("Visualización de {}", name)
        }
    };

    let body = match &history.state {
        HistoryState::Idle | HistoryState::Loading => AnalysisBody::Loading {
            message: ANALYSIS_LOADING_MESSAGE.to_string(),
        },
        HistoryState::Failed(message) => AnalysisBody::Error {
            message: message.clone(),
        },
        HistoryState::Empty => AnalysisBody::Empty {
            message: ANALYSIS_EMPTY_MESSAGE.to_string(),
        },
        HistoryState::Ready(points) => charts(points, query.range),
    };

    AnalysisView {
        title,
        range: query.range,
        body,
    }
}

fn label(timestamp: &DateTime<Utc>, range: RangeKey) -> String {
    let format = match range {
        RangeKey::Last24h => "%H:%M",
        RangeKey::Last7d => "%-d/%-m %H:00",
        RangeKey::Last30d | RangeKey::Last90d => "%-d/%-m",
    };
    timestamp.format(format).to_string()
}

fn dataset(metric: ChartMetric, points: &[HistoricalPoint]) -> Dataset {
    Dataset {
        label: metric.dataset_label(),
        color: metric.color().to_string(),
        values: points.iter().map(|p| metric.value(p)).collect(),
    }
}

fn charts(points: &[HistoricalPoint], range: RangeKey) -> AnalysisBody {
    let labels: Vec<String> = points.iter().map(|p| label(&p.timestamp, range)).collect();

    let trend = SeriesChart {
        title: "Temperatura y Humedad",
        labels: labels.clone(),
        datasets: vec![
            dataset(ChartMetric::Temperature, points),
            dataset(ChartMetric::Humidity, points),
        ],
    };

    let rainfall = SeriesChart {
        title: "Nivel de Lluvia",
        labels,
        datasets: vec![dataset(ChartMetric::Rainfall, points)],
    };

    // Latest points, oldest first, each one more opaque than the last
    let recent = &points[points.len().saturating_sub(RADAR_POINTS)..];
    let factors = SeriesChart {
        title: "Comparación de Factores",
        labels: RADAR_AXES.iter().map(|a| a.to_string()).collect(),
        datasets: recent
            .iter()
            .enumerate()
            .map(|(i, p)| Dataset {
                label: label(&p.timestamp, range),
                color: format!("rgba(0, 206, 209, {:.2})", 0.1 + i as f64 * 0.15),
                values: vec![p.temperatura, p.humedad, p.lluvia, p.sol],
            })
            .collect(),
    };

    AnalysisBody::Charts {
        trend,
        rainfall,
        factors,
    }
}
