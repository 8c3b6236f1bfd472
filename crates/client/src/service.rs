//! The seam between the lifecycle engine and the remote dubbing service.
//!
//! Submission, polling and the roster only talk to [`JobService`], so
//! they can be driven by [`DubbingApi`] in production and by scripted
//! in-memory services in tests.

use async_trait::async_trait;
use autodub_core::job::Job;
use autodub_core::submission::DubRequest;

use crate::api::{ApiError, DubbingApi, SubmitResponse};

#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a job on the service.
    async fn submit(&self, request: &DubRequest) -> Result<SubmitResponse, ApiError>;

    /// Read the current snapshot of one job.
    async fn fetch_job(&self, job_id: &str) -> Result<Job, ApiError>;

    /// Read every job the service knows about.
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;

    /// Liveness probe.
    async fn health(&self) -> Result<(), ApiError>;

    /// Fetch a finished job's artifact.
    async fn download(&self, job_id: &str) -> Result<Vec<u8>, ApiError>;

    /// Turn a service-relative artifact path into a full URL.
    fn artifact_url(&self, path: &str) -> String;
}

#[async_trait]
impl JobService for DubbingApi {
    async fn submit(&self, request: &DubRequest) -> Result<SubmitResponse, ApiError> {
        self.submit_job(request).await
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Job, ApiError> {
        self.get_job(job_id).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        DubbingApi::list_jobs(self).await
    }

    async fn health(&self) -> Result<(), ApiError> {
        DubbingApi::health(self).await
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        DubbingApi::download(self, job_id).await
    }

    fn artifact_url(&self, path: &str) -> String {
        self.resolve_url(path)
    }
}
