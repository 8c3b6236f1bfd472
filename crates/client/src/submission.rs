//! Submission controller: validate a dub form and create the remote job.
//!
//! The controller never starts polling itself. Callers hand the returned
//! [`JobHandle`] to the polling engine exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use autodub_core::error::CoreError;
use autodub_core::job::JobStatus;
use autodub_core::submission::DubForm;
use autodub_core::types::JobId;

use crate::api::ApiError;
use crate::service::JobService;

/// Shown when the service gave no usable error message.
pub const GENERIC_SUBMIT_FAILURE: &str = "Failed to create dubbing job";

/// A job the service has accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: JobId,
    pub status: Option<JobStatus>,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The form was rejected locally; no request was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// Another submission from this controller has not finished yet.
    #[error("A submission is already in progress")]
    InProgress,

    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("Failed to create dubbing job: {0}")]
    Transport(String),

    /// The service answered 2xx with an unusable body.
    #[error("Failed to create dubbing job: malformed response ({0})")]
    MalformedResponse(String),
}

impl From<ApiError> for SubmitError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Api {
                status, message, ..
            } => Self::Rejected {
                status,
                message: message.unwrap_or_else(|| GENERIC_SUBMIT_FAILURE.to_string()),
            },
            ApiError::Request(e) => Self::Transport(e.to_string()),
            ApiError::MalformedBody(e) => Self::MalformedResponse(e.to_string()),
        }
    }
}

/// Sends new jobs to the dubbing service, one at a time.
pub struct SubmissionController {
    service: Arc<dyn JobService>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SubmissionController {
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    /// `true` while a submission request is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate `form` and create the job.
    ///
    /// Validation happens before any state changes. Once the request is
    /// sent, the controller returns to a resubmittable state however the
    /// call ends.
    pub async fn submit(&self, form: &DubForm) -> Result<JobHandle, SubmitError> {
        let request = form.validate()?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SubmitError::InProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        tracing::info!(
            youtube_url = %request.youtube_url,
            target_language = %request.target_language,
            start_time = ?request.start_time,
            end_time = ?request.end_time,
            "Submitting dubbing job",
        );

        let response = match self.service.submit(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Dubbing job submission failed");
                return Err(e.into());
            }
        };

        let job_id = response.job_id.trim().to_string();
        if job_id.is_empty() {
            tracing::error!("Dubbing service returned an empty job_id");
            return Err(SubmitError::MalformedResponse("empty job_id".into()));
        }

        tracing::info!(job_id = %job_id, "Dubbing job created");

        Ok(JobHandle {
            job_id,
            status: response.status,
            message: response.message,
        })
    }
}
