//! Maps view models to display-ready screens.
//!
//! Pure functions only. Absent counts become `0` here and nowhere else.

use serde::Serialize;

use crate::api::Endpoints;
use crate::model::{AggregateState, DetailState, HistoryPoint, LotSummary};
use crate::reconcile::ViewModel;
use crate::route::Route;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatTriple {
    pub total: u64,
    pub available: u64,
    pub occupied: u64,
}

impl From<&LotSummary> for StatTriple {
    fn from(lot: &LotSummary) -> Self {
        Self {
            total: lot.total.unwrap_or(0),
            available: lot.available.unwrap_or(0),
            occupied: lot.occupied.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotCard {
    pub lot_key: String,
    pub title: String,
    pub stats: StatTriple,
    /// Where "More Info" leads.
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardScreen {
    Loading,
    Ready {
        notice: Option<String>,
        cards: Vec<LotCard>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub time: String,
    pub available: u64,
    pub occupied: u64,
}

impl From<&HistoryPoint> for HistoryRow {
    fn from(point: &HistoryPoint) -> Self {
        Self {
            time: point.time.clone(),
            available: point.available.unwrap_or(0),
            occupied: point.occupied.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailScreen {
    Loading {
        lot_id: String,
    },
    Ready {
        title: String,
        stats: StatTriple,
        history: Vec<HistoryRow>,
        stream_url: String,
        notice: Option<String>,
    },
}

/// Lot number shown to the viewer: `lot2` -> `2`.
pub fn lot_number(lot_key: &str) -> &str {
    match lot_key.strip_prefix("lot") {
        Some(rest) if !rest.is_empty() => rest,
        _ => lot_key,
    }
}

/// One card per lot in `lots`, in that order, whatever the model holds.
pub fn dashboard_screen(view: &ViewModel<AggregateState>, lots: &[String]) -> DashboardScreen {
    if view.loading {
        return DashboardScreen::Loading;
    }

    let cards = lots
        .iter()
        .map(|key| {
            let number = lot_number(key);
            let stats = view.model.get(key).map(StatTriple::from);
            LotCard {
                lot_key: key.clone(),
                title: format!("Parking Lot {number}"),
                stats: stats.unwrap_or_default(),
                details: Route::details(number).to_string(),
            }
        })
        .collect();

    let notice = view.error.as_ref().map(|e| format!("{e} - Using demo data"));
    DashboardScreen::Ready { notice, cards }
}

pub fn detail_screen(
    view: &ViewModel<DetailState>,
    lot_id: &str,
    endpoints: &Endpoints,
) -> DetailScreen {
    if view.loading {
        return DetailScreen::Loading {
            lot_id: lot_id.to_string(),
        };
    }

    DetailScreen::Ready {
        title: format!("Parking Lot {lot_id} Details"),
        stats: StatTriple::from(&view.model.summary),
        history: view.model.history.iter().map(HistoryRow::from).collect(),
        stream_url: endpoints.video_stream(lot_id).to_string(),
        notice: view.error.clone(),
    }
}
