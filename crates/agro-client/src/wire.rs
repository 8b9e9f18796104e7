//! Wire payloads validated before they become model types

use agro_core::{Parcela, SensorReading, Snapshot};
use serde::Deserialize;

use crate::{ClientError, ClientResult};

/// Snapshot body as received; either field may be absent or null
#[derive(Debug, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub sensores: Option<SensorReading>,
    #[serde(default)]
    pub parcelas: Option<Vec<Parcela>>,
}

impl SnapshotPayload {
    /// Accept the payload only if both halves are present
    pub fn into_snapshot(self) -> ClientResult<Snapshot> {
        match (self.sensores, self.parcelas) {
            (Some(sensores), Some(parcelas)) => Ok(Snapshot { sensores, parcelas }),
            (None, _) => Err(ClientError::MalformedResponse(
                "missing field `sensores`".to_string(),
            )),
            (_, None) => Err(ClientError::MalformedResponse(
                "missing field `parcelas`".to_string(),
            )),
        }
    }
}
