//! Single-slot job status polling engine.
//!
//! [`PollingEngine`] owns at most one live [`PollSubscription`]. Each
//! subscription is a spawned task that fetches the job status
//! immediately, then once per interval, until the job reaches a terminal
//! state or the subscription is cancelled. Starting a new subscription
//! always cancels the previous one first.
//!
//! Ticks are serialized: the next tick is only scheduled once the
//! previous fetch has finished. The subscription's [`CancellationToken`]
//! is checked after every await. Observer delivery happens while holding
//! the engine's live-subscription lock, which `start_polling` and `reset`
//! also take, so a superseded subscription never reaches the observer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError};
use std::time::Duration;

use autodub_core::job::JobStatus;
use autodub_core::types::JobId;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::events::JobObserver;
use crate::service::JobService;

/// Engine-local identity of one polling subscription.
pub type SubscriptionId = u64;

/// Reference polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Upper bound on a single status fetch.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing parameters for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// How a subscription ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    /// Superseded, reset, or cancelled by the caller.
    Cancelled,
}

/// A tick that failed without ending the subscription.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Failed to fetch job status: {0}")]
    Fetch(#[from] ApiError),

    #[error("Status request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Status response was for job {actual}, expected {expected}")]
    Mismatch { expected: JobId, actual: JobId },
}

// ---------------------------------------------------------------------------
// Subscription handle
// ---------------------------------------------------------------------------

/// Handle to one polling loop for one job.
///
/// Cheap to clone; every clone refers to the same loop.
#[derive(Debug, Clone)]
pub struct PollSubscription {
    id: SubscriptionId,
    job_id: JobId,
    /// Cancelled to stop the loop, either by the caller or by the loop
    /// itself once a terminal state is seen.
    cancel: CancellationToken,
    /// Cancelled once the polling task has exited.
    done: CancellationToken,
    outcome: Arc<OnceLock<PollOutcome>>,
}

impl PollSubscription {
    fn new(id: SubscriptionId, job_id: JobId) -> Self {
        Self {
            id,
            job_id,
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            outcome: Arc::new(OnceLock::new()),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop polling. Idempotent; a no-op once the loop has ended.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` until the subscription is cancelled or reaches a terminal state.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// `true` once the polling task has exited.
    pub fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Wait for the polling task to exit and report why it ended.
    pub async fn finished(&self) -> PollOutcome {
        self.done.cancelled().await;
        self.outcome.get().copied().unwrap_or(PollOutcome::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the single "current subscription" slot of a client instance.
pub struct PollingEngine {
    service: Arc<dyn JobService>,
    observer: Arc<dyn JobObserver>,
    settings: PollSettings,
    /// Notified after every successful tick (used to refresh the roster).
    tick_notify: Option<Arc<Notify>>,
    current: Mutex<Option<PollSubscription>>,
    /// Id of the subscription allowed to publish. Held for the whole of
    /// every observer delivery.
    live: Arc<std::sync::Mutex<Option<SubscriptionId>>>,
    next_id: AtomicU64,
}

impl PollingEngine {
    pub fn new(
        service: Arc<dyn JobService>,
        observer: Arc<dyn JobObserver>,
        settings: PollSettings,
    ) -> Self {
        Self {
            service,
            observer,
            settings,
            tick_notify: None,
            current: Mutex::new(None),
            live: Arc::new(std::sync::Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Wake `notify` after every successful poll tick.
    pub fn with_tick_notify(mut self, notify: Arc<Notify>) -> Self {
        self.tick_notify = Some(notify);
        self
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Start polling `job_id`, cancelling any existing subscription first.
    ///
    /// The first status fetch is issued immediately rather than after one
    /// interval. Must be called from within a tokio runtime.
    pub async fn start_polling(&self, job_id: impl Into<JobId>) -> PollSubscription {
        let job_id = job_id.into();
        let mut current = self.current.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;

        {
            // Waits for any in-progress delivery of the previous subscription.
            let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = current.take() {
                if previous.is_active() {
                    tracing::debug!(
                        subscription_id = previous.id,
                        job_id = %previous.job_id,
                        "Superseding active poll subscription",
                    );
                }
                previous.cancel();
            }
            *live = Some(id);
        }

        let subscription = PollSubscription::new(id, job_id);

        tracing::info!(
            subscription_id = id,
            job_id = %subscription.job_id,
            interval_ms = self.settings.interval.as_millis() as u64,
            "Starting poll subscription",
        );

        let task = PollTask {
            service: Arc::clone(&self.service),
            observer: Arc::clone(&self.observer),
            settings: self.settings,
            tick_notify: self.tick_notify.clone(),
            live: Arc::clone(&self.live),
            subscription: subscription.clone(),
        };
        tokio::spawn(task.run());

        *current = Some(subscription.clone());
        subscription
    }

    /// The most recently started subscription, live or not.
    pub async fn current(&self) -> Option<PollSubscription> {
        self.current.lock().await.clone()
    }

    /// The current subscription, if it is still polling.
    pub async fn active(&self) -> Option<PollSubscription> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|s| s.is_active())
            .cloned()
    }

    /// Cancel the current subscription and clear the slot.
    pub async fn reset(&self) {
        let mut current = self.current.lock().await;
        let previous = {
            let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
            *live = None;
            current.take()
        };
        if let Some(previous) = previous {
            tracing::info!(subscription_id = previous.id, "Resetting poll subscription");
            previous.cancel();
        }
    }
}

// ---------------------------------------------------------------------------
// Polling task
// ---------------------------------------------------------------------------

/// Everything one polling loop needs, moved into its task.
struct PollTask {
    service: Arc<dyn JobService>,
    observer: Arc<dyn JobObserver>,
    settings: PollSettings,
    tick_notify: Option<Arc<Notify>>,
    live: Arc<std::sync::Mutex<Option<SubscriptionId>>>,
    subscription: PollSubscription,
}

impl PollTask {
    async fn run(self) {
        let outcome = self.poll_until_done().await;
        let sub = &self.subscription;

        let _ = sub.outcome.set(outcome);
        sub.cancel.cancel();
        sub.done.cancel();

        tracing::info!(
            subscription_id = sub.id,
            job_id = %sub.job_id,
            ?outcome,
            "Poll subscription ended",
        );
    }

    async fn poll_until_done(&self) -> PollOutcome {
        let sub = &self.subscription;
        let cancel = &sub.cancel;

        // The first tick of an interval completes immediately.
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = tokio::time::timeout(
                    self.settings.request_timeout,
                    self.service.fetch_job(&sub.job_id),
                ) => result,
            };

            let job = match fetched {
                Ok(Ok(job)) if job.job_id == sub.job_id => job,
                Ok(Ok(job)) => {
                    self.report_transient(PollError::Mismatch {
                        expected: sub.job_id.clone(),
                        actual: job.job_id,
                    });
                    continue;
                }
                Ok(Err(e)) => {
                    self.report_transient(PollError::Fetch(e));
                    continue;
                }
                Err(_) => {
                    self.report_transient(PollError::TimedOut(self.settings.request_timeout));
                    continue;
                }
            };

            tracing::debug!(
                subscription_id = sub.id,
                job_id = %sub.job_id,
                status = %job.status,
                progress = job.progress_percent(),
                "Job status update",
            );

            let outcome = match job.status {
                JobStatus::Completed => Some(PollOutcome::Completed),
                JobStatus::Failed => Some(PollOutcome::Failed),
                _ => None,
            };

            let delivered = self.publish_if_live(|| {
                // Stop the loop before notifying so the terminal event is final.
                if outcome.is_some() {
                    cancel.cancel();
                }

                self.observer.on_update(sub.id, &job);
                match outcome {
                    Some(PollOutcome::Completed) => {
                        tracing::info!(
                            subscription_id = sub.id,
                            job_id = %sub.job_id,
                            video_url = ?job.video_url,
                            "Job completed",
                        );
                        self.observer
                            .on_result(sub.id, &sub.job_id, job.video_url.as_deref());
                    }
                    Some(PollOutcome::Failed) => {
                        tracing::warn!(
                            subscription_id = sub.id,
                            job_id = %sub.job_id,
                            message = job.failure_message(),
                            "Job failed",
                        );
                        self.observer
                            .on_failure(sub.id, &sub.job_id, job.failure_message());
                    }
                    _ => {}
                }
            });

            // Superseded or reset between the fetch and the publish.
            if !delivered {
                return PollOutcome::Cancelled;
            }

            if let Some(notify) = &self.tick_notify {
                notify.notify_one();
            }

            if let Some(outcome) = outcome {
                return outcome;
            }
        }
    }

    fn report_transient(&self, error: PollError) {
        let sub = &self.subscription;
        self.publish_if_live(|| {
            tracing::warn!(
                subscription_id = sub.id,
                job_id = %sub.job_id,
                error = %error,
                "Poll tick failed, retrying on next tick",
            );
            self.observer.on_transient_error(sub.id, &sub.job_id, &error);
        });
    }

    /// Run `deliver` only if this subscription is still the engine's live,
    /// uncancelled one. Returns whether it ran.
    fn publish_if_live(&self, deliver: impl FnOnce()) -> bool {
        let sub = &self.subscription;
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if *live != Some(sub.id) || sub.cancel.is_cancelled() {
            return false;
        }
        deliver();
        true
    }
}
