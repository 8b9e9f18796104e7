//! Parcelas table and deleted-parcelas table

use agro_client::ClientResult;
use agro_core::{DeletedParcela, Parcela, ParcelaId};
use agro_sync::{SnapshotOrigin, StoreState};
use serde::Serialize;

use super::{fmt_humidity, fmt_temperature};

pub const PARCELAS_LOADING_MESSAGE: &str = "Cargando datos de parcelas...";
pub const PARCELAS_UNAVAILABLE_MESSAGE: &str = "No se pudieron cargar los datos de parcelas";
pub const DELETED_ERROR_MESSAGE: &str = "Error al cargar las parcelas eliminadas";
pub const DELETED_EMPTY_MESSAGE: &str = "No hay parcelas eliminadas en el sistema";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelaRow {
    pub id: ParcelaId,
    pub nombre: String,
    pub ubicacion: String,
    pub responsable: String,
    pub tipo_cultivo: String,
    pub ultimo_riego: String,
    pub humedad: String,
    pub temperatura: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ParcelasTableView {
    Loading {
        message: String,
    },
    Error {
        message: String,
    },
    Rows {
        origin: SnapshotOrigin,
        rows: Vec<ParcelaRow>,
    },
}

pub fn parcelas_table(state: &StoreState) -> ParcelasTableView {
    match &state.data {
        Some(data) if !data.snapshot.parcelas.is_empty() => ParcelasTableView::Rows {
            origin: data.origin,
            rows: data.snapshot.parcelas.iter().map(parcela_row).collect(),
        },
        None if state.is_loading() => ParcelasTableView::Loading {
            message: PARCELAS_LOADING_MESSAGE.to_string(),
        },
        _ => ParcelasTableView::Error {
            message: state
                .error
                .clone()
                .unwrap_or_else(|| PARCELAS_UNAVAILABLE_MESSAGE.to_string()),
        },
    }
}

fn parcela_row(parcela: &Parcela) -> ParcelaRow {
    // Raw values, as the table has always shown them
    ParcelaRow {
        id: parcela.id,
        nombre: parcela.nombre.clone(),
        ubicacion: parcela.ubicacion.clone(),
        responsable: parcela.responsable.clone(),
        tipo_cultivo: parcela.tipo_cultivo.clone(),
        ultimo_riego: parcela.ultimo_riego.clone(),
        humedad: format!("{}%", parcela.sensor.humedad),
        temperatura: format!("{}°C", parcela.sensor.temperatura),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedParcelaRow {
    pub parcela_id: ParcelaId,
    pub nombre: String,
    pub tipo_cultivo: String,
    pub last_measured: String,
    pub temperatura: String,
    pub humedad: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeletedParcelasView {
    Error { message: String },
    Empty { message: String },
    Rows { count: usize, rows: Vec<DeletedParcelaRow> },
}

pub fn deleted_parcelas_view(result: &ClientResult<Vec<DeletedParcela>>) -> DeletedParcelasView {
    match result {
        Err(_) => DeletedParcelasView::Error {
            message: DELETED_ERROR_MESSAGE.to_string(),
        },
        Ok(parcelas) if parcelas.is_empty() => DeletedParcelasView::Empty {
            message: DELETED_EMPTY_MESSAGE.to_string(),
        },
        Ok(parcelas) => DeletedParcelasView::Rows {
            count: parcelas.len(),
            rows: parcelas.iter().map(deleted_row).collect(),
        },
    }
}

fn deleted_row(parcela: &DeletedParcela) -> DeletedParcelaRow {
    let reading = &parcela.last_reading;
    DeletedParcelaRow {
        parcela_id: parcela.parcela_id,
        nombre: parcela.nombre.clone(),
        tipo_cultivo: parcela.tipo_cultivo.clone(),
        last_measured: reading.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        temperatura: fmt_temperature(reading.temperatura),
        humedad: fmt_humidity(reading.humedad),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_client::ClientError;
    use agro_core::{fallback_snapshot, LastReading};
    use agro_sync::{StoreData, SyncStatus, FETCH_ERROR_MESSAGE};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn state(status: SyncStatus, data: Option<StoreData>, error: Option<&str>) -> StoreState {
        StoreState {
            status,
            data,
            error: error.map(str::to_string),
            applied_seq: 0,
        }
    }

    fn fallback_data() -> StoreData {
        StoreData {
            snapshot: Arc::new(fallback_snapshot()),
            origin: SnapshotOrigin::Fallback,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rows_from_fallback_snapshot() {
        let view = parcelas_table(&state(
            SyncStatus::Failed,
            Some(fallback_data()),
            Some(FETCH_ERROR_MESSAGE),
        ));

        match view {
            ParcelasTableView::Rows { origin, rows } => {
                assert_eq!(origin, SnapshotOrigin::Fallback);
                assert_eq!(rows.len(), 4);
                assert_eq!(rows[1].humedad, "80.5%");
                assert_eq!(rows[1].temperatura, "15°C");
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn loading_before_first_snapshot() {
        let view = parcelas_table(&state(SyncStatus::Loading, None, None));
        assert_eq!(
            view,
            ParcelasTableView::Loading {
                message: PARCELAS_LOADING_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn empty_snapshot_is_reported() {
        let mut data = fallback_data();
        data.origin = SnapshotOrigin::Live;
        data.snapshot = Arc::new(agro_core::Snapshot {
            parcelas: Vec::new(),
            ..fallback_snapshot()
        });

        let view = parcelas_table(&state(SyncStatus::Ready, Some(data), None));
        assert_eq!(
            view,
            ParcelasTableView::Error {
                message: PARCELAS_UNAVAILABLE_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn deleted_parcelas_states() {
        let failed: ClientResult<Vec<DeletedParcela>> =
            Err(ClientError::Transport("HTTP 500".into()));
        assert_eq!(
            deleted_parcelas_view(&failed),
            DeletedParcelasView::Error {
                message: DELETED_ERROR_MESSAGE.to_string()
            }
        );

        assert_eq!(
            deleted_parcelas_view(&Ok(Vec::new())),
            DeletedParcelasView::Empty {
                message: DELETED_EMPTY_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn deleted_parcelas_rows() {
        let deleted = vec![DeletedParcela {
            parcela_id: 5,
            nombre: "Parcela 5".to_string(),
            tipo_cultivo: "Frijol".to_string(),
            last_reading: LastReading {
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
                temperatura: 19.25,
                humedad: 55.5,
                lluvia: 0.0,
                sol: 42.0,
            },
        }];

        match deleted_parcelas_view(&Ok(deleted)) {
            DeletedParcelasView::Rows { count, rows } => {
                assert_eq!(count, 1);
                assert_eq!(rows[0].last_measured, "2025-03-01 08:30:00");
                assert_eq!(rows[0].humedad, "55.5%");
                assert!(rows[0].temperatura.ends_with("°C"));
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }
}
