//! Observer interface for job lifecycle events.
//!
//! The polling engine is presentation-agnostic: every state change it
//! observes is pushed through an injected [`JobObserver`]. UIs that prefer
//! a stream can use [`BroadcastObserver`], which republishes everything as
//! [`JobEvent`]s on a [`tokio::sync::broadcast`] channel.

use autodub_core::job::Job;
use autodub_core::types::JobId;
use tokio::sync::broadcast;

use crate::poller::{PollError, SubscriptionId};

/// Broadcast channel capacity for job events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Sink for events produced by one polling engine.
///
/// Callbacks run on the polling task and should return quickly.
pub trait JobObserver: Send + Sync {
    /// A fresh snapshot was fetched. Fires for every successful tick,
    /// including the terminal one.
    fn on_update(&self, subscription: SubscriptionId, job: &Job);

    /// The job completed. Fires at most once per subscription.
    fn on_result(&self, subscription: SubscriptionId, job_id: &str, video_url: Option<&str>);

    /// The job failed on the server. Fires at most once per subscription.
    fn on_failure(&self, subscription: SubscriptionId, job_id: &str, message: &str);

    /// A single tick failed; polling continues.
    fn on_transient_error(&self, _subscription: SubscriptionId, _job_id: &str, _error: &PollError) {}
}

/// A job lifecycle event, as republished by [`BroadcastObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// A status snapshot was fetched.
    Updated {
        subscription: SubscriptionId,
        job: Job,
    },

    /// The job completed and its artifact is ready.
    ResultReady {
        subscription: SubscriptionId,
        job_id: JobId,
        video_url: Option<String>,
    },

    /// The job failed on the server.
    Failed {
        subscription: SubscriptionId,
        job_id: JobId,
        message: String,
    },

    /// A status fetch failed; polling continues.
    PollError {
        subscription: SubscriptionId,
        job_id: JobId,
        error: String,
    },
}

impl JobEvent {
    pub fn subscription(&self) -> SubscriptionId {
        match self {
            Self::Updated { subscription, .. }
            | Self::ResultReady { subscription, .. }
            | Self::Failed { subscription, .. }
            | Self::PollError { subscription, .. } => *subscription,
        }
    }

    /// `true` for the result/failure events that end a subscription.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResultReady { .. } | Self::Failed { .. })
    }
}

/// Republishes observer callbacks as [`JobEvent`]s.
pub struct BroadcastObserver {
    event_tx: broadcast::Sender<JobEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    fn publish(&self, event: JobEvent) {
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.event_tx.send(event);
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl JobObserver for BroadcastObserver {
    fn on_update(&self, subscription: SubscriptionId, job: &Job) {
        self.publish(JobEvent::Updated {
            subscription,
            job: job.clone(),
        });
    }

    fn on_result(&self, subscription: SubscriptionId, job_id: &str, video_url: Option<&str>) {
        self.publish(JobEvent::ResultReady {
            subscription,
            job_id: job_id.to_string(),
            video_url: video_url.map(str::to_string),
        });
    }

    fn on_failure(&self, subscription: SubscriptionId, job_id: &str, message: &str) {
        self.publish(JobEvent::Failed {
            subscription,
            job_id: job_id.to_string(),
            message: message.to_string(),
        });
    }

    fn on_transient_error(&self, subscription: SubscriptionId, job_id: &str, error: &PollError) {
        self.publish(JobEvent::PollError {
            subscription,
            job_id: job_id.to_string(),
            error: error.to_string(),
        });
    }
}
