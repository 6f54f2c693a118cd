//! Occupancy payloads as reported by the monitoring backend.
//!
//! Counts are kept exactly as the backend sends them. A field that is missing
//! or `null` stays `None` here; substituting zero is the job of
//! [`crate::present`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total/available/occupied triple for one lot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied: Option<u64>,
}

impl LotSummary {
    pub fn new(total: u64, available: u64, occupied: u64) -> Self {
        Self {
            total: Some(total),
            available: Some(available),
            occupied: Some(occupied),
        }
    }
}

/// Every lot's summary keyed by lot id (`lot1`, `lot2`, ...).
///
/// Serialized transparently, so it matches the `/api/parking-data` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateState(pub BTreeMap<String, LotSummary>);

impl AggregateState {
    /// All-zero state for the given lot ids, used until the first poll lands.
    pub fn zeroed<I, S>(lot_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            lot_ids
                .into_iter()
                .map(|id| (id.into(), LotSummary::new(0, 0, 0)))
                .collect(),
        )
    }

    pub fn get(&self, lot_id: &str) -> Option<&LotSummary> {
        self.0.get(lot_id)
    }
}

impl<S: Into<String>> FromIterator<(S, LotSummary)> for AggregateState {
    fn from_iter<I: IntoIterator<Item = (S, LotSummary)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One sample of a lot's occupancy history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Wall-clock label as produced by the backend, e.g. `10:05:00`.
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied: Option<u64>,
}

impl HistoryPoint {
    pub fn new(time: impl Into<String>, available: u64, occupied: u64) -> Self {
        Self {
            time: time.into(),
            available: Some(available),
            occupied: Some(occupied),
        }
    }
}

/// Body of `/api/parking-details?lot={id}`. History is oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailState {
    #[serde(flatten)]
    pub summary: LotSummary,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}
