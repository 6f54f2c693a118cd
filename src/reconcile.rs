//! Turns poll outcomes into the model a view renders.
//!
//! A failed poll never leaves the view blank: the model falls back to a fixed
//! demo snapshot and an error message is raised next to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetch::FetchFailure;
use crate::model::{AggregateState, DetailState, HistoryPoint, LotSummary};

pub const AGGREGATE_ERROR: &str = "Failed to fetch parking data";
pub const DETAIL_ERROR: &str = "Failed to fetch parking details";

/// What a failed poll does to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Every failure shows the demo snapshot.
    #[default]
    Always,
    /// Only failures before the first success show the demo snapshot; later
    /// failures leave the last good model in place.
    KeepStale,
}

/// Renderable state of one view.
///
/// `error` and `model` are independent: an error can be shown alongside
/// stale or fallback data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel<M> {
    pub model: M,
    pub error: Option<String>,
    pub loading: bool,
    /// When the last successful poll landed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl<M> ViewModel<M> {
    /// A view that has not seen any outcome yet.
    pub fn loading(initial: M) -> Self {
        Self {
            model: initial,
            error: None,
            loading: true,
            updated_at: None,
        }
    }
}

/// Pure reconciliation of one outcome: the payload verbatim on success, the
/// fallback plus `message` on failure.
pub fn reconcile<M: Clone>(
    outcome: Result<M, FetchFailure>,
    fallback: &M,
    message: &str,
) -> (M, Option<String>) {
    match outcome {
        Ok(payload) => (payload, None),
        Err(_) => (fallback.clone(), Some(message.to_string())),
    }
}

/// Applies outcomes to a [`ViewModel`] for the life of one subscription.
pub struct Reconciler<M> {
    fallback: M,
    message: String,
    policy: FallbackPolicy,
    has_succeeded: bool,
}

impl<M: Clone> Reconciler<M> {
    pub fn new(fallback: M, message: impl Into<String>, policy: FallbackPolicy) -> Self {
        Self {
            fallback,
            message: message.into(),
            policy,
            has_succeeded: false,
        }
    }

    pub fn apply(&mut self, view: &mut ViewModel<M>, outcome: Result<M, FetchFailure>) {
        let succeeded = outcome.is_ok();
        let keep_stale =
            !succeeded && self.policy == FallbackPolicy::KeepStale && self.has_succeeded;

        let (model, error) = reconcile(outcome, &self.fallback, &self.message);
        if !keep_stale {
            view.model = model;
        }
        view.error = error;
        view.loading = false;

        if succeeded {
            self.has_succeeded = true;
            view.updated_at = Some(Utc::now());
        }
    }
}

/// Demo data shown by the dashboard when the backend is unreachable.
pub fn aggregate_fallback() -> AggregateState {
    [
        ("lot1", LotSummary::new(25, 12, 13)),
        ("lot2", LotSummary::new(30, 8, 22)),
    ]
    .into_iter()
    .collect()
}

/// Demo data shown by the detail view when the backend is unreachable.
pub fn detail_fallback(lot_id: &str) -> DetailState {
    let summary = if lot_id == "1" {
        LotSummary::new(25, 12, 13)
    } else {
        LotSummary::new(30, 8, 22)
    };
    DetailState {
        summary,
        history: vec![
            HistoryPoint::new("10:00:00", 15, 10),
            HistoryPoint::new("10:05:00", 14, 11),
            HistoryPoint::new("10:10:00", 13, 12),
            HistoryPoint::new("10:15:00", 12, 13),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn failure() -> FetchFailure {
        FetchFailure::Status(StatusCode::SERVICE_UNAVAILABLE)
    }

    fn aggregate_reconciler(policy: FallbackPolicy) -> Reconciler<AggregateState> {
        Reconciler::new(aggregate_fallback(), AGGREGATE_ERROR, policy)
    }

    #[test]
    fn test_reconcile_success_is_verbatim() {
        let lot = LotSummary {
            total: Some(3),
            available: None,
            occupied: Some(7),
        };
        let payload: AggregateState = [("lot9", lot)].into_iter().collect();

        let (model, error) = reconcile(Ok(payload.clone()), &aggregate_fallback(), AGGREGATE_ERROR);

        assert_eq!(model, payload);
        assert_eq!(error, None);
    }

    #[test]
    fn test_reconcile_failure_is_fallback() {
        let (model, error) = reconcile(Err(failure()), &aggregate_fallback(), AGGREGATE_ERROR);

        assert_eq!(model, aggregate_fallback());
        assert_eq!(error.as_deref(), Some(AGGREGATE_ERROR));
    }

    #[test]
    fn test_first_failure_leaves_loading_with_fallback() {
        let mut view = ViewModel::loading(AggregateState::zeroed(["lot1", "lot2"]));
        let mut reconciler = aggregate_reconciler(FallbackPolicy::Always);

        reconciler.apply(&mut view, Err(failure()));

        assert!(!view.loading);
        assert_eq!(view.model.get("lot1"), Some(&LotSummary::new(25, 12, 13)));
        assert_eq!(view.model.get("lot2"), Some(&LotSummary::new(30, 8, 22)));
        assert_eq!(view.error.as_deref(), Some("Failed to fetch parking data"));
        assert_eq!(view.updated_at, None);
    }

    #[test]
    fn test_success_clears_error() {
        let mut view = ViewModel::loading(AggregateState::default());
        let mut reconciler = aggregate_reconciler(FallbackPolicy::Always);
        let payload = AggregateState::zeroed(["lot1"]);

        reconciler.apply(&mut view, Err(failure()));
        reconciler.apply(&mut view, Ok(payload.clone()));

        assert_eq!(view.model, payload);
        assert_eq!(view.error, None);
        assert!(view.updated_at.is_some());
    }

    #[test]
    fn test_loading_never_returns() {
        let mut view = ViewModel::loading(AggregateState::default());
        let mut reconciler = aggregate_reconciler(FallbackPolicy::Always);
        assert!(view.loading);

        reconciler.apply(&mut view, Ok(AggregateState::default()));
        assert!(!view.loading);
        reconciler.apply(&mut view, Err(failure()));
        assert!(!view.loading);
        reconciler.apply(&mut view, Ok(AggregateState::default()));
        assert!(!view.loading);
    }

    #[test]
    fn test_always_policy_replaces_good_data() {
        let mut view = ViewModel::loading(AggregateState::default());
        let mut reconciler = aggregate_reconciler(FallbackPolicy::Always);

        reconciler.apply(&mut view, Ok(AggregateState::zeroed(["lot1"])));
        reconciler.apply(&mut view, Err(failure()));

        assert_eq!(view.model, aggregate_fallback());
        assert!(view.error.is_some());
    }

    #[test]
    fn test_keep_stale_policy() {
        let mut view = ViewModel::loading(AggregateState::default());
        let mut reconciler = aggregate_reconciler(FallbackPolicy::KeepStale);
        let good = AggregateState::zeroed(["lot1"]);

        reconciler.apply(&mut view, Err(failure()));
        assert_eq!(view.model, aggregate_fallback());

        reconciler.apply(&mut view, Ok(good.clone()));
        let stamp = view.updated_at;
        reconciler.apply(&mut view, Err(failure()));

        assert_eq!(view.model, good);
        assert_eq!(view.error.as_deref(), Some(AGGREGATE_ERROR));
        assert_eq!(view.updated_at, stamp);
    }

    #[test]
    fn test_detail_fallback_by_lot() {
        assert_eq!(detail_fallback("1").summary, LotSummary::new(25, 12, 13));
        assert_eq!(detail_fallback("2").summary, LotSummary::new(30, 8, 22));
        assert_eq!(detail_fallback("7").summary, LotSummary::new(30, 8, 22));

        let times: Vec<_> = detail_fallback("1")
            .history
            .into_iter()
            .map(|p| p.time)
            .collect();
        assert_eq!(times, ["10:00:00", "10:05:00", "10:10:00", "10:15:00"]);
    }
}
