//! Parcela selection and active-reading resolution

use thiserror::Error;

use crate::{Parcela, ParcelaId, SensorReading, Snapshot};

/// Why the aggregate reading is shown instead of a parcela's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FallbackReason {
    #[error("No parcela selected")]
    NoSelection,

    #[error("Selected parcela {0} is not in the current snapshot")]
    StaleSelection(ParcelaId),
}

/// Which parcela, if any, is focused
///
/// The id is a lookup key into whatever snapshot is current; it is never
/// resolved into an owned copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<ParcelaId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, parcela_id: Option<ParcelaId>) {
        self.selected = parcela_id;
    }

    pub fn selected(&self) -> Option<ParcelaId> {
        self.selected
    }

    /// Resolve the selection against `snapshot`
    pub fn try_resolve<'a>(&self, snapshot: &'a Snapshot) -> Result<&'a Parcela, FallbackReason> {
        let id = self.selected.ok_or(FallbackReason::NoSelection)?;
        snapshot
            .parcela(id)
            .ok_or(FallbackReason::StaleSelection(id))
    }

    /// Reading to display: the selected parcela's, else the aggregate
    pub fn resolve<'a>(&self, snapshot: &'a Snapshot) -> &'a SensorReading {
        match self.try_resolve(snapshot) {
            Ok(parcela) => &parcela.sensor,
            Err(_) => &snapshot.sensores,
        }
    }
}
