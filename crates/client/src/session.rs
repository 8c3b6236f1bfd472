//! A client session: submission, live polling and the roster, composed.
//!
//! [`DubbingSession`] is what a front end drives. It wires the polling
//! engine's tick signal into the roster task so the job list is refreshed
//! opportunistically while a job is being watched.

use std::sync::Arc;

use autodub_core::roster::RosterView;
use autodub_core::submission::DubForm;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::config::ClientConfig;
use crate::events::JobObserver;
use crate::health::{check_health, HealthStatus};
use crate::poller::{PollSettings, PollSubscription, PollingEngine};
use crate::roster::{spawn_roster_task, JobRoster, RosterError, RosterObserver};
use crate::service::JobService;
use crate::submission::{JobHandle, SubmissionController, SubmitError};

pub struct DubbingSession {
    service: Arc<dyn JobService>,
    config: ClientConfig,
    submitter: SubmissionController,
    engine: PollingEngine,
    roster: Arc<JobRoster>,
    roster_trigger: Arc<Notify>,
    roster_task: Mutex<Option<JoinHandle<()>>>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
}

impl DubbingSession {
    pub fn new(
        service: Arc<dyn JobService>,
        observer: Arc<dyn JobObserver>,
        config: ClientConfig,
    ) -> Self {
        let roster_trigger = Arc::new(Notify::new());
        let settings = PollSettings {
            interval: config.poll_interval,
            request_timeout: config.request_timeout,
        };

        Self {
            submitter: SubmissionController::new(Arc::clone(&service)),
            engine: PollingEngine::new(Arc::clone(&service), observer, settings)
                .with_tick_notify(Arc::clone(&roster_trigger)),
            roster: Arc::new(JobRoster::new(Arc::clone(&service))),
            roster_trigger,
            roster_task: Mutex::new(None),
            cancel: CancellationToken::new(),
            service,
            config,
        }
    }

    /// Submit a new job and start polling it.
    ///
    /// On failure nothing is polled and any existing subscription is left
    /// untouched, so the user can retry immediately.
    pub async fn submit_and_track(
        &self,
        form: &DubForm,
    ) -> Result<(JobHandle, PollSubscription), SubmitError> {
        let handle = self.submitter.submit(form).await?;
        let subscription = self.engine.start_polling(handle.job_id.clone()).await;
        self.roster_trigger.notify_one();
        Ok((handle, subscription))
    }

    /// Start watching a job picked from the roster.
    pub async fn select_job(&self, job_id: &str) -> PollSubscription {
        tracing::info!(job_id, "Selected job from roster");
        self.engine.start_polling(job_id).await
    }

    /// Stop polling and return to the idle state.
    pub async fn reset(&self) {
        self.engine.reset().await;
    }

    /// The live subscription, if any.
    pub async fn active_subscription(&self) -> Option<PollSubscription> {
        self.engine.active().await
    }

    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    /// Fetch the roster view once.
    pub async fn refresh_roster(&self) -> Result<RosterView, RosterError> {
        self.roster.view().await
    }

    /// Keep `observer` fed with roster views until shutdown. Replaces any
    /// previously started roster watch.
    pub async fn watch_roster(&self, observer: Arc<dyn RosterObserver>) {
        let handle = spawn_roster_task(
            Arc::clone(&self.roster),
            observer,
            self.config.roster_refresh_interval,
            Arc::clone(&self.roster_trigger),
            self.cancel.child_token(),
        );

        if let Some(previous) = self.roster_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        check_health(self.service.as_ref()).await
    }

    /// Full URL for a job's artifact path.
    pub fn artifact_url(&self, video_url: &str) -> String {
        self.service.artifact_url(video_url)
    }

    pub async fn download(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        self.service.download(job_id).await
    }

    /// Stop polling and the roster task.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down dubbing session");
        self.engine.reset().await;
        self.cancel.cancel();

        if let Some(task) = self.roster_task.lock().await.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), task).await;
        }
    }
}
