//! Fixed-cadence polling with an irreversible stop.
//!
//! A [`PollingSubscription`] owns one timer task and hands every poll outcome
//! to a callback, exactly once per poll, until it is stopped. Stopping is
//! cooperative: an in-flight request is left to finish, but its outcome is
//! dropped instead of delivered.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, warn};

use crate::fetch::FetchFailure;

/// How polls are spaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Schedule {
    /// A poll starts every period, measured from poll start. A slow response
    /// may overlap the next poll and outcomes may arrive out of order.
    #[default]
    FixedRate,
    /// The next poll starts one period after the previous one resolved.
    /// Never overlaps, so outcomes arrive in issue order.
    FixedDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("subscription `{0}` is already running")]
    AlreadyRunning(String),
    #[error("subscription `{0}` was stopped; create a new one instead")]
    Stopped(String),
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

type Callback<T> = Box<dyn FnMut(Result<T, FetchFailure>) + Send>;

struct Slot<T> {
    state: SubscriptionState,
    on_result: Option<Callback<T>>,
}

/// State shared between the owner and the timer/fetch tasks.
///
/// Deliveries and `stop` take the same lock, so once `stop` has returned no
/// callback can be running or start running.
struct Shared<T> {
    label: String,
    slot: Mutex<Slot<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn deliver(&self, outcome: Result<T, FetchFailure>) -> bool {
        let mut slot = self.lock();
        if slot.state != SubscriptionState::Running {
            debug!(subscription = %self.label, "Discarding outcome that arrived after stop");
            return false;
        }
        if let Err(e) = &outcome {
            warn!(subscription = %self.label, error = %e, "Poll failed");
        }
        match slot.on_result.as_mut() {
            Some(on_result) => {
                on_result(outcome);
                true
            }
            None => false,
        }
    }
}

pub struct PollingSubscription<T> {
    shared: Arc<Shared<T>>,
    timer: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> PollingSubscription<T> {
    /// Creates an idle subscription. `label` only shows up in logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                label: label.into(),
                slot: Mutex::new(Slot {
                    state: SubscriptionState::Idle,
                    on_result: None,
                }),
            }),
            timer: None,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.lock().state
    }

    /// Polls `fetch` now and every `period` after, with fixed-rate spacing.
    pub fn start<F, Fut, R>(
        &mut self,
        fetch: F,
        period: Duration,
        on_result: R,
    ) -> Result<(), SubscriptionError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchFailure>> + Send + 'static,
        R: FnMut(Result<T, FetchFailure>) + Send + 'static,
    {
        self.start_with(Schedule::FixedRate, fetch, period, on_result)
    }

    /// Like [`start`](Self::start) with an explicit [`Schedule`].
    ///
    /// Must be called from within a tokio runtime. `on_result` runs while the
    /// subscription's lock is held, so it must not call back into this
    /// subscription.
    pub fn start_with<F, Fut, R>(
        &mut self,
        schedule: Schedule,
        fetch: F,
        period: Duration,
        on_result: R,
    ) -> Result<(), SubscriptionError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchFailure>> + Send + 'static,
        R: FnMut(Result<T, FetchFailure>) + Send + 'static,
    {
        if period.is_zero() {
            return Err(SubscriptionError::ZeroInterval);
        }
        {
            let mut slot = self.shared.lock();
            match slot.state {
                SubscriptionState::Idle => {}
                SubscriptionState::Running => {
                    return Err(SubscriptionError::AlreadyRunning(self.shared.label.clone()));
                }
                SubscriptionState::Stopped => {
                    return Err(SubscriptionError::Stopped(self.shared.label.clone()));
                }
            }
            slot.state = SubscriptionState::Running;
            slot.on_result = Some(Box::new(on_result));
        }

        debug!(
            subscription = %self.shared.label,
            ?schedule,
            period_ms = period.as_millis() as u64,
            "Subscription started"
        );

        let span = tracing::debug_span!("poll", subscription = %self.shared.label);
        let shared = Arc::clone(&self.shared);
        let timer = match schedule {
            Schedule::FixedRate => tokio::spawn(fixed_rate(shared, fetch, period).instrument(span)),
            Schedule::FixedDelay => {
                tokio::spawn(fixed_delay(shared, fetch, period).instrument(span))
            }
        };
        self.timer = Some(timer);
        Ok(())
    }
}

impl<T> PollingSubscription<T> {
    /// Cancels the timer. After this returns no outcome is delivered, even
    /// for requests that were already in flight. Idempotent.
    pub fn stop(&mut self) {
        {
            let mut slot = self.shared.lock();
            if slot.state != SubscriptionState::Stopped {
                debug!(subscription = %self.shared.label, "Subscription stopped");
            }
            slot.state = SubscriptionState::Stopped;
            slot.on_result = None;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<T> Drop for PollingSubscription<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn fixed_rate<T, F, Fut>(shared: Arc<Shared<T>>, fetch: F, period: Duration)
where
    T: Send + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>> + Send + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now(), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        debug!("Issuing poll");
        let request = fetch();
        let shared = Arc::clone(&shared);
        // Each poll runs on its own so a slow one never holds up the next tick.
        tokio::spawn(
            async move {
                let outcome = request.await;
                shared.deliver(outcome);
            }
            .in_current_span(),
        );
    }
}

async fn fixed_delay<T, F, Fut>(shared: Arc<Shared<T>>, fetch: F, period: Duration)
where
    T: Send + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchFailure>> + Send + 'static,
{
    loop {
        debug!("Issuing poll");
        let request = fetch();
        let poll_shared = Arc::clone(&shared);
        // The request gets its own task so that aborting the timer while it
        // is in flight leaves it running; `deliver` then drops its outcome.
        let poll = tokio::spawn(
            async move {
                let outcome = request.await;
                poll_shared.deliver(outcome)
            }
            .in_current_span(),
        );
        match poll.await {
            Ok(true) => tokio::time::sleep(period).await,
            Ok(false) | Err(_) => return,
        }
    }
}
