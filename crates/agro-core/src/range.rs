//! Time windows selectable on the historical chart

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Interval;

/// User-facing time window for historical data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeKey {
    #[default]
    #[serde(rename = "24h")]
    Last24h,
    #[serde(rename = "7d")]
    Last7d,
    #[serde(rename = "30d")]
    Last30d,
    #[serde(rename = "90d")]
    Last90d,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown range: {0}")]
pub struct ParseRangeError(pub String);

impl RangeKey {
    pub const ALL: [RangeKey; 4] = [
        RangeKey::Last24h,
        RangeKey::Last7d,
        RangeKey::Last30d,
        RangeKey::Last90d,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::Last24h => "24h",
            RangeKey::Last7d => "7d",
            RangeKey::Last30d => "30d",
            RangeKey::Last90d => "90d",
        }
    }

    /// `(days, interval)` pair sent to the history endpoint
    pub fn query(&self) -> (u32, Interval) {
        match self {
            RangeKey::Last24h => (1, Interval::Hour),
            RangeKey::Last7d => (7, Interval::Hour),
            RangeKey::Last30d => (30, Interval::Day),
            RangeKey::Last90d => (90, Interval::Day),
        }
    }

    /// Only the 24h window is re-fetched on a timer
    pub fn auto_refresh(&self) -> bool {
        matches!(self, RangeKey::Last24h)
    }

    /// Short windows label points by time of day, long ones by date
    pub fn labels_by_time(&self) -> bool {
        matches!(self, RangeKey::Last24h | RangeKey::Last7d)
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeKey {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeKey::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseRangeError(s.to_string()))
    }
}
