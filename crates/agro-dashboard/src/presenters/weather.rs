//! Weather panels: the four readings of the focused parcela or the aggregate

use agro_core::{FallbackReason, SelectionState, SensorReading};
use agro_sync::StoreState;
use serde::Serialize;

use super::{fmt_humidity, fmt_rainfall, fmt_sun, fmt_temperature};

/// Readings shown before any snapshot exists
const EMPTY_READING: SensorReading = SensorReading {
    temperatura: 0.0,
    humedad: 0.0,
    lluvia: 0.0,
    sol: 0.0,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPanel {
    pub key: &'static str,
    pub title: &'static str,
    pub value: String,
}

/// Which reading the panels are showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    Parcela,
    Aggregate,
    /// A parcela is selected but missing from the snapshot
    StaleSelection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherPanelsView {
    pub loading: bool,
    pub parcela_name: Option<String>,
    pub source: ReadingSource,
    pub panels: Vec<WeatherPanel>,
}

pub fn weather_panels(state: &StoreState, selection: &SelectionState) -> WeatherPanelsView {
    let (reading, parcela_name, source) = match state.snapshot() {
        None => (&EMPTY_READING, None, ReadingSource::Aggregate),
        Some(snapshot) => match selection.try_resolve(snapshot) {
            Ok(parcela) => (
                &parcela.sensor,
                Some(parcela.nombre.clone()),
                ReadingSource::Parcela,
            ),
            Err(FallbackReason::NoSelection) => {
                (&snapshot.sensores, None, ReadingSource::Aggregate)
            }
            Err(FallbackReason::StaleSelection(_)) => {
                (&snapshot.sensores, None, ReadingSource::StaleSelection)
            }
        },
    };

    WeatherPanelsView {
        loading: state.is_loading(),
        parcela_name,
        source,
        panels: panels(reading),
    }
}

fn panels(reading: &SensorReading) -> Vec<WeatherPanel> {
    vec![
        WeatherPanel {
            key: "temperature",
            title: "Temperatura",
            value: fmt_temperature(reading.temperatura),
        },
        WeatherPanel {
            key: "humidity",
            title: "Humedad",
            value: fmt_humidity(reading.humedad),
        },
        WeatherPanel {
            key: "rainfall",
            title: "Lluvia",
            value: fmt_rainfall(reading.lluvia),
        },
        WeatherPanel {
            key: "sunlight",
            title: "Intensidad del Sol",
            value: fmt_sun(reading.sol),
        },
    ]
}
