//! Core data types and selection logic for the AgroIoT dashboard
//!
//! This crate provides the sensor/parcela model shared by the remote client,
//! the synchronization store and the presenters, together with the static
//! fallback snapshot and the time-range table used by historical charts.

pub mod fallback;
pub mod range;
pub mod selection;
pub mod types;

pub use fallback::*;
pub use range::*;
pub use selection::*;
pub use types::*;
