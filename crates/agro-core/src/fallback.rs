//! Static snapshot shown when no live data has ever been fetched

use crate::{Parcela, SensorReading, Snapshot};

const FALLBACK_RIEGO: &str = "2025-03-17 14:44:29";

fn parcela(
    id: i64,
    ubicacion: &str,
    responsable: &str,
    tipo_cultivo: &str,
    sensor: SensorReading,
    latitud: f64,
    longitud: f64,
) -> Parcela {
    Parcela {
        id,
        nombre: format!("Parcela {}", id),
        ubicacion: ubicacion.to_string(),
        responsable: responsable.to_string(),
        tipo_cultivo: tipo_cultivo.to_string(),
        ultimo_riego: FALLBACK_RIEGO.to_string(),
        sensor,
        latitud,
        longitud,
    }
}

/// Fallback snapshot: an aggregate reading and four parcelas around Cancún
pub fn fallback_snapshot() -> Snapshot {
    Snapshot {
        sensores: SensorReading {
            temperatura: 22.0,
            humedad: 63.7,
            lluvia: 2.5,
            sol: 60.0,
        },
        parcelas: vec![
            parcela(
                1,
                "Zona Norte",
                "Juan Pérez",
                "Tomate",
                SensorReading {
                    temperatura: 18.5,
                    humedad: 35.5,
                    lluvia: 6.3,
                    sol: 70.0,
                },
                21.055722864565006,
                -86.86942155001661,
            ),
            parcela(
                2,
                "Zona Sur",
                "Ana Martínez",
                "Maíz",
                SensorReading {
                    temperatura: 15.0,
                    humedad: 80.5,
                    lluvia: 4.0,
                    sol: 25.0,
                },
                21.065014162508156,
                -86.88796097929945,
            ),
            parcela(
                3,
                "Zona Este",
                "Carlos Gómez",
                "Papa",
                SensorReading {
                    temperatura: 18.5,
                    humedad: 70.0,
                    lluvia: 1.2,
                    sol: 60.0,
                },
                21.069979963109926,
                -86.88100869331838,
            ),
            parcela(
                4,
                "Zona Oeste",
                "María López",
                "Arroz",
                SensorReading {
                    temperatura: 18.5,
                    humedad: 80.5,
                    lluvia: 4.0,
                    sol: 70.0,
                },
                21.067497083532892,
                -86.8715673172947,
            ),
        ],
    }
}
