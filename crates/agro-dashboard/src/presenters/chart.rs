//! Historical line chart

use agro_core::{HistoricalPoint, RangeKey, Snapshot};
use agro_sync::{HistoryState, HistoryView};
use serde::{Deserialize, Serialize};

pub const CHART_EMPTY_MESSAGE: &str = "No hay datos disponibles";

/// Series shown by the active chart tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMetric {
    #[default]
    Temperature,
    Humidity,
    Rainfall,
    Sunlight,
}

impl ChartMetric {
    /// Field of [`HistoricalPoint`] the tab plots
    pub fn field(&self) -> &'static str {
        match self {
            ChartMetric::Temperature => "temperatura",
            ChartMetric::Humidity => "humedad",
            ChartMetric::Rainfall => "lluvia",
            ChartMetric::Sunlight => "sol",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ChartMetric::Temperature => "°C",
            ChartMetric::Humidity | ChartMetric::Sunlight => "%",
            ChartMetric::Rainfall => "mm",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ChartMetric::Temperature => "#FF5733",
            ChartMetric::Humidity => "#33A1FD",
            ChartMetric::Rainfall => "#6675FF",
            ChartMetric::Sunlight => "#FFCC33",
        }
    }

    pub fn value(&self, point: &HistoricalPoint) -> f64 {
        match self {
            ChartMetric::Temperature => point.temperatura,
            ChartMetric::Humidity => point.humedad,
            ChartMetric::Rainfall => point.lluvia,
            ChartMetric::Sunlight => point.sol,
        }
    }

    /// Legend label, e.g. "Temperatura (°C)"
    pub fn dataset_label(&self) -> String {
        let field = self.field();
        let mut chars = field.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{} ({})", capitalized, self.unit())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ChartBody {
    Loading,
    Error { message: String },
    Empty { message: String },
    Series { labels: Vec<String>, values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub title: String,
    pub range: RangeKey,
    pub metric: ChartMetric,
    pub dataset_label: String,
    pub color: &'static str,
    pub body: ChartBody,
}

/// Build the chart view; `snapshot` only supplies the parcela name
pub fn chart_view(
    history: &HistoryView,
    snapshot: Option<&Snapshot>,
    metric: ChartMetric,
) -> ChartView {
    let query = history.query;
    let title = match query.parcela_id {
        None => "Datos históricos generales".to_string(),
        Some(id) => {
            let name = snapshot
                .and_then(|s| s.parcela(id))
                .map(|p| p.nombre.clone())
                .unwrap_or_else(|| format!("Parcela {}", id));
            format!("Datos históricos: {}", name)
        }
    };

    let body = match &history.state {
        HistoryState::Idle | HistoryState::Loading => ChartBody::Loading,
        HistoryState::Failed(message) => ChartBody::Error {
            message: message.clone(),
        },
        HistoryState::Empty => ChartBody::Empty {
            message: CHART_EMPTY_MESSAGE.to_string(),
        },
        HistoryState::Ready(points) => series(points, query.range, metric),
    };

    ChartView {
        title,
        range: query.range,
        metric,
        dataset_label: metric.dataset_label(),
        color: metric.color(),
        body,
    }
}

fn series(points: &[HistoricalPoint], range: RangeKey, metric: ChartMetric) -> ChartBody {
    let label_format = if range.labels_by_time() { "%H:%M" } else { "%d/%m" };
    let labels = points
        .iter()
        .map(|p| p.timestamp.format(label_format).to_string())
        .collect();
    let values = points
        .iter()
        .map(|p| (metric.value(p) * 10.0).round() / 10.0)
        .collect();
    ChartBody::Series { labels, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::fallback_snapshot;
    use agro_sync::{HistoryQuery, HISTORY_ERROR_MESSAGE};
    use chrono::{TimeZone, Utc};

    fn points() -> Vec<HistoricalPoint> {
        vec![
            HistoricalPoint {
                bucket: None,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 16, 9, 0, 0).unwrap(),
                temperatura: 18.44,
                humedad: 70.06,
                lluvia: 0.0,
                sol: 12.0,
            },
            HistoricalPoint {
                bucket: None,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 17, 14, 30, 0).unwrap(),
                temperatura: 24.96,
                humedad: 55.0,
                lluvia: 1.26,
                sol: 80.0,
            },
        ]
    }

    fn view(query: HistoryQuery, state: HistoryState) -> HistoryView {
        HistoryView { query, state }
    }

    #[test]
    fn time_labels_for_short_ranges() {
        let history = view(HistoryQuery::default(), HistoryState::Ready(points()));

        let chart = chart_view(&history, None, ChartMetric::Temperature);

        assert_eq!(chart.title, "Datos históricos generales");
        assert_eq!(chart.dataset_label, "Temperatura (°C)");
        assert_eq!(
            chart.body,
            ChartBody::Series {
                labels: vec!["09:00".to_string(), "14:30".to_string()],
                values: vec![18.4, 25.0],
            }
        );
    }

    #[test]
    fn date_labels_for_long_ranges() {
        let query = HistoryQuery {
            parcela_id: Some(2),
            range: RangeKey::Last30d,
        };
        let history = view(query, HistoryState::Ready(points()));
        let snapshot = fallback_snapshot();

        let chart = chart_view(&history, Some(&snapshot), ChartMetric::Rainfall);

        assert_eq!(chart.title, "Datos históricos: Parcela 2");
        assert_eq!(chart.color, "#6675FF");
        assert_eq!(
            chart.body,
            ChartBody::Series {
                labels: vec!["16/03".to_string(), "17/03".to_string()],
                values: vec![0.0, 1.3],
            }
        );
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let query = HistoryQuery {
            parcela_id: Some(7),
            range: RangeKey::Last24h,
        };
        let chart = chart_view(&view(query, HistoryState::Empty), None, ChartMetric::Humidity);

        assert_eq!(
            chart.body,
            ChartBody::Empty {
                message: CHART_EMPTY_MESSAGE.to_string()
            }
        );
        assert_eq!(chart.title, "Datos históricos: Parcela 7");
    }

    #[test]
    fn failure_shows_error_message() {
        let history = view(
            HistoryQuery::default(),
            HistoryState::Failed(HISTORY_ERROR_MESSAGE.to_string()),
        );

        let chart = chart_view(&history, None, ChartMetric::Sunlight);

        assert_eq!(
            chart.body,
            ChartBody::Error {
                message: HISTORY_ERROR_MESSAGE.to_string()
            }
        );
        assert_eq!(chart.dataset_label, "Sol (%)");
    }

    #[test]
    fn idle_renders_as_loading() {
        let chart = chart_view(
            &view(HistoryQuery::default(), HistoryState::Idle),
            None,
            ChartMetric::default(),
        );
        assert_eq!(chart.body, ChartBody::Loading);
    }
}
