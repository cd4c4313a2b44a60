pub mod collector;
pub mod percentiles;
pub mod round;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use collector::{SummaryCollector, SummarySnapshot};
pub use percentiles::PercentileSet;
pub use round::{Measurement, RoundStats};

/// HTTP status code → number of responses carrying it.
///
/// Renders as a JSON object keyed by code, e.g. `{"200":1,"500":2}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<u16, u64>);

impl StatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: u16) {
        *self.0.entry(code).or_insert(0) += 1;
    }

    /// Zero for codes never seen.
    pub fn get(&self, code: u16) -> u64 {
        self.0.get(&code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.0.iter().map(|(&code, &count)| (code, count))
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &StatusCounts) {
        for (code, count) in other.iter() {
            *self.0.entry(code).or_insert(0) += count;
        }
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
