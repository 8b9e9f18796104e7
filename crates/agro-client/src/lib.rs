//! Remote data client for the AgroIoT sensor API
//!
//! The [`DataSource`] trait is the seam between the synchronization layer
//! and the network. [`HttpDataSource`] is the production implementation;
//! tests drive the store and loader through scripted implementations.

pub mod http;
pub mod wire;

pub use http::*;

use agro_core::{DeletedParcela, HistoricalPoint, Interval, ParcelaId, Snapshot};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure, timeout or non-2xx status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Body is not the documented JSON shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ClientError::MalformedResponse(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Source of snapshots and historical series
///
/// Implementations perform exactly one request per call: no retries and no
/// caching.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the aggregate reading and every parcela
    async fn fetch_snapshot(&self) -> ClientResult<Snapshot>;

    /// Fetch a bucketed series, for one parcela or for the aggregate
    async fn fetch_history(
        &self,
        parcela_id: Option<ParcelaId>,
        days: u32,
        interval: Interval,
    ) -> ClientResult<Vec<HistoricalPoint>>;

    /// Fetch parcelas that were removed, with their last reading
    async fn fetch_deleted_parcelas(&self) -> ClientResult<Vec<DeletedParcela>>;
}
