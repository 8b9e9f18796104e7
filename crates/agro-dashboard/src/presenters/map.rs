//! Map markers for every parcela

use agro_core::{Parcela, ParcelaId, SelectionState, Snapshot};
use serde::Serialize;

use super::{fmt_humidity, fmt_rainfall, fmt_sun, fmt_temperature};

/// Cancún, as (longitude, latitude)
pub const MAP_CENTER: [f64; 2] = [-86.87436454154599, 21.063013076491483];
pub const MAP_ZOOM: f64 = 11.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: ParcelaId,
    /// (longitude, latitude)
    pub position: [f64; 2],
    pub title: String,
    pub selected: bool,
    pub popup: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: f64,
    pub active_count: usize,
    pub markers: Vec<MapMarker>,
}

pub fn map_view(snapshot: Option<&Snapshot>, selection: &SelectionState) -> MapView {
    let markers: Vec<MapMarker> = snapshot
        .map(|s| {
            s.parcelas
                .iter()
                .map(|p| marker(p, selection.selected() == Some(p.id)))
                .collect()
        })
        .unwrap_or_default();

    MapView {
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        active_count: markers.len(),
        markers,
    }
}

fn marker(parcela: &Parcela, selected: bool) -> MapMarker {
    let sensor = &parcela.sensor;
    MapMarker {
        id: parcela.id,
        position: [parcela.longitud, parcela.latitud],
        title: parcela.nombre.clone(),
        selected,
        popup: vec![
            format!("Cultivo: {}", parcela.tipo_cultivo),
            format!("Ubicación: {}", parcela.ubicacion),
            format!("Responsable: {}", parcela.responsable),
            format!("Humedad: {}", fmt_humidity(sensor.humedad)),
            format!("Temperatura: {}", fmt_temperature(sensor.temperatura)),
            format!("Lluvia: {}", fmt_rainfall(sensor.lluvia)),
            format!("Sol: {}", fmt_sun(sensor.sol)),
        ],
    }
}
