//! Binds polling subscriptions to the lifetime of the views that show them.
//!
//! Each view owns its subscription and the only sender for its model. A lot
//! switch in the detail view drops both and builds new ones, so nothing from
//! the previous lot can reach the new model.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::api::OccupancySource;
use crate::config::SyncConfig;
use crate::model::{AggregateState, DetailState};
use crate::poll::{PollingSubscription, SubscriptionError};
use crate::reconcile::{
    AGGREGATE_ERROR, DETAIL_ERROR, Reconciler, ViewModel, aggregate_fallback, detail_fallback,
};

/// A running subscription together with the model it writes.
struct Binding<M> {
    subscription: PollingSubscription<M>,
    model: watch::Receiver<ViewModel<M>>,
}

impl<M: Clone + Send + Sync + 'static> Binding<M> {
    fn start<F, Fut>(
        label: String,
        initial: M,
        mut reconciler: Reconciler<M>,
        config: &SyncConfig,
        fetch: F,
    ) -> Result<Self, SubscriptionError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<M, crate::fetch::FetchFailure>> + Send + 'static,
    {
        let (tx, model) = watch::channel(ViewModel::loading(initial));
        let mut subscription = PollingSubscription::new(label);
        subscription.start_with(config.schedule, fetch, config.poll_interval(), move |outcome| {
            tx.send_modify(|view| reconciler.apply(view, outcome));
        })?;
        Ok(Self {
            subscription,
            model,
        })
    }
}

/// Summary of every lot, refreshed while mounted.
pub struct AggregateView {
    binding: Binding<AggregateState>,
}

impl AggregateView {
    pub fn mount(
        source: Arc<dyn OccupancySource>,
        config: &SyncConfig,
    ) -> Result<Self, SubscriptionError> {
        info!(lots = ?config.lots, interval_ms = config.poll_interval_ms, "Mounting dashboard");
        let reconciler = Reconciler::new(aggregate_fallback(), AGGREGATE_ERROR, config.fallback);
        let binding = Binding::start(
            "parking-data".to_string(),
            AggregateState::zeroed(config.lots.iter().cloned()),
            reconciler,
            config,
            move || {
                let source = Arc::clone(&source);
                async move { source.parking_data().await }
            },
        )?;
        Ok(Self { binding })
    }

    /// Receiver that is notified on every model change.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel<AggregateState>> {
        self.binding.model.clone()
    }

    pub fn current(&self) -> ViewModel<AggregateState> {
        self.binding.model.borrow().clone()
    }

    /// Stops polling; the model stays readable but never changes again.
    pub fn unmount(mut self) -> ViewModel<AggregateState> {
        info!("Unmounting dashboard");
        self.binding.subscription.stop();
        self.current()
    }
}

/// Counts and history for one lot, refreshed while mounted.
pub struct DetailView {
    source: Arc<dyn OccupancySource>,
    config: SyncConfig,
    lot_id: String,
    binding: Binding<DetailState>,
}

impl DetailView {
    pub fn mount(
        source: Arc<dyn OccupancySource>,
        config: &SyncConfig,
        lot_id: impl Into<String>,
    ) -> Result<Self, SubscriptionError> {
        let lot_id = lot_id.into();
        info!(lot_id = %lot_id, interval_ms = config.poll_interval_ms, "Mounting lot details");
        let binding = Self::bind(&source, config, &lot_id)?;
        Ok(Self {
            source,
            config: config.clone(),
            lot_id,
            binding,
        })
    }

    fn bind(
        source: &Arc<dyn OccupancySource>,
        config: &SyncConfig,
        lot_id: &str,
    ) -> Result<Binding<DetailState>, SubscriptionError> {
        let reconciler = Reconciler::new(detail_fallback(lot_id), DETAIL_ERROR, config.fallback);
        let source = Arc::clone(source);
        let lot = lot_id.to_string();
        Binding::start(
            format!("parking-details:{lot_id}"),
            DetailState::default(),
            reconciler,
            config,
            move || {
                let source = Arc::clone(&source);
                let lot = lot.clone();
                async move { source.parking_details(&lot).await }
            },
        )
    }

    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Follows a change of the lot id in the current location.
    ///
    /// The old subscription is stopped before the new one starts; the new
    /// model starts over in `loading` and a receiver from
    /// [`subscribe`](Self::subscribe) taken before the switch sees no further
    /// changes. Switching to the current lot does nothing.
    pub fn set_lot(&mut self, lot_id: impl Into<String>) -> Result<(), SubscriptionError> {
        let lot_id = lot_id.into();
        if lot_id == self.lot_id {
            return Ok(());
        }
        info!(from = %self.lot_id, to = %lot_id, "Switching lot");
        self.binding.subscription.stop();
        self.binding = Self::bind(&self.source, &self.config, &lot_id)?;
        self.lot_id = lot_id;
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewModel<DetailState>> {
        self.binding.model.clone()
    }

    pub fn current(&self) -> ViewModel<DetailState> {
        self.binding.model.borrow().clone()
    }

    pub fn unmount(mut self) -> ViewModel<DetailState> {
        info!(lot_id = %self.lot_id, "Unmounting lot details");
        self.binding.subscription.stop();
        self.current()
    }
}
