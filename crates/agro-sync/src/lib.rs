//! Snapshot synchronization and historical series loading
//!
//! [`SyncStore`] polls the snapshot endpoint and publishes every state
//! transition on a watch channel. [`HistoryLoader`] keeps the chart series in
//! step with the selected parcela and time window.

pub mod history;
pub mod store;

pub use history::*;
pub use store::*;

#[cfg(test)]
pub(crate) mod testing;
