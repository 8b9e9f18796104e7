//! Core data types for sensor snapshots and historical series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parcela identifier as sent by the API
pub type ParcelaId = i64;

/// One reading of the four sensor channels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Air temperature (°C)
    pub temperatura: f64,

    /// Relative humidity (%)
    pub humedad: f64,

    /// Rainfall (mm)
    pub lluvia: f64,

    /// Sun intensity (%)
    pub sol: f64,
}

/// A named, geolocated plot with its own sensor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parcela {
    pub id: ParcelaId,
    pub nombre: String,
    pub ubicacion: String,
    pub responsable: String,
    pub tipo_cultivo: String,

    /// Last irrigation, passed through as the API formats it
    pub ultimo_riego: String,

    pub sensor: SensorReading,
    pub latitud: f64,
    pub longitud: f64,
}

/// One complete fetch result: aggregate reading plus every parcela
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub sensores: SensorReading,
    pub parcelas: Vec<Parcela>,
}

impl Snapshot {
    /// Look up a parcela by id
    pub fn parcela(&self, id: ParcelaId) -> Option<&Parcela> {
        self.parcelas.iter().find(|p| p.id == id)
    }
}

/// Bucketing granularity for historical queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hour,
    Day,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hour => "hour",
            Interval::Day => "day",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket key the history API attaches to each point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
}

/// One time-bucketed point of a historical series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalPoint {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<BucketKey>,

    pub timestamp: DateTime<Utc>,
    pub temperatura: f64,
    pub humedad: f64,
    pub lluvia: f64,
    pub sol: f64,
}

/// Last reading recorded for a parcela before it was deleted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastReading {
    pub timestamp: DateTime<Utc>,
    pub temperatura: f64,
    pub humedad: f64,
    pub lluvia: f64,
    pub sol: f64,
}

/// A parcela that no longer appears in snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletedParcela {
    #[serde(rename = "parcelaId")]
    pub parcela_id: ParcelaId,
    pub nombre: String,
    pub tipo_cultivo: String,
    #[serde(rename = "lastReading")]
    pub last_reading: LastReading,
}
