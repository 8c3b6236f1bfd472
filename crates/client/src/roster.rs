//! Historical job roster.
//!
//! [`JobRoster::refresh`] re-fetches the full job list on every call and
//! orders it most-recent-first. [`spawn_roster_task`] keeps a
//! [`RosterObserver`] fed in the background, refreshing on a timer and
//! whenever the polling engine signals that a tick completed.

use std::sync::Arc;
use std::time::Duration;

use autodub_core::job::Job;
use autodub_core::roster::{order_most_recent_first, RosterView};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::service::JobService;

#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch jobs: {0}")]
pub struct RosterError(#[from] pub ApiError);

/// Sink for roster views.
pub trait RosterObserver: Send + Sync {
    fn on_roster(&self, view: &RosterView);

    /// A refresh failed. The previously rendered view should stay in place.
    fn on_roster_error(&self, _error: &RosterError) {}
}

pub struct JobRoster {
    service: Arc<dyn JobService>,
}

impl JobRoster {
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self { service }
    }

    /// Fetch every known job, deduplicated and most-recent-first.
    pub async fn refresh(&self) -> Result<Vec<Job>, RosterError> {
        let jobs = self.service.list_jobs().await?;
        let total = jobs.len();
        let jobs = order_most_recent_first(jobs);

        tracing::debug!(
            fetched = total,
            unique = jobs.len(),
            "Job roster refreshed",
        );
        Ok(jobs)
    }

    /// Fetch and build the display view in one step.
    pub async fn view(&self) -> Result<RosterView, RosterError> {
        let jobs = self.refresh().await?;
        Ok(RosterView::from_jobs(&jobs))
    }
}

/// Spawn a task that refreshes the roster every `interval` and whenever
/// `trigger` is notified, until `cancel` fires.
///
/// Failures are logged and reported to the observer; they never end the
/// task.
pub fn spawn_roster_task(
    roster: Arc<JobRoster>,
    observer: Arc<dyn RosterObserver>,
    interval: Duration,
    trigger: Arc<Notify>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = trigger.notified() => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = roster.view() => result,
            };

            match result {
                Ok(view) => observer.on_roster(&view),
                Err(e) => {
                    tracing::warn!(error = %e, "Roster refresh failed, keeping previous view");
                    observer.on_roster_error(&e);
                }
            }
        }

        tracing::debug!("Roster task exited");
    })
}
