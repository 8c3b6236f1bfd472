//! REST API client for the dubbing service HTTP endpoints.
//!
//! Wraps job submission, status retrieval, job listing, the health probe
//! and artifact download using [`reqwest`].

use std::time::Duration;

use autodub_core::job::{Job, JobStatus};
use autodub_core::submission::DubRequest;
use serde::Deserialize;

/// HTTP client for a single dubbing service.
pub struct DubbingApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `POST /api/dub` after the job was accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the new job.
    pub job_id: String,
    /// Initial status, if the service reports one.
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/jobs`.
#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Error body the service sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Errors from the dubbing service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Dubbing API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
        /// The `error` field of the body, when it parsed as JSON.
        message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl ApiError {
    /// The message the service put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::MalformedBody(_) => None,
        }
    }
}

impl DubbingApi {
    /// Create a new API client with a per-request timeout.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Base HTTP URL of the service.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a dubbing job.
    ///
    /// Sends `POST /api/dub` and returns the server-assigned `job_id`.
    pub async fn submit_job(&self, request: &DubRequest) -> Result<SubmitResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/dub", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status snapshot of a job.
    pub async fn get_job(&self, job_id: &str) -> Result<Job, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/dub/{}", self.api_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List every job the service knows about, in server order.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/jobs", self.api_url))
            .send()
            .await?;

        let body: JobsResponse = Self::parse_response(response).await?;
        Ok(body.jobs)
    }

    /// Liveness probe against `GET /health`.
    pub async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Download the finished artifact of a job as raw bytes.
    pub async fn download(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(self.download_url(job_id)).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Absolute URL of `GET /api/download/{job_id}`.
    pub fn download_url(&self, job_id: &str) -> String {
        format!("{}/api/download/{}", self.api_url, job_id)
    }

    /// Resolve a service-relative path (such as a job's `video_url`)
    /// against the base URL. Absolute URLs are returned unchanged.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Api`] with the
    /// status, body text and any `error` message on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
                message,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// The body is read as text first so that a shape mismatch surfaces
    /// as [`ApiError::MalformedBody`] rather than a transport error.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> DubbingApi {
        DubbingApi::with_client(reqwest::Client::new(), "http://localhost:5000/")
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(api().api_url(), "http://localhost:5000");
    }

    #[test]
    fn relative_video_url_is_resolved_against_base() {
        assert_eq!(
            api().resolve_url("/api/download/abc"),
            "http://localhost:5000/api/download/abc"
        );
        assert_eq!(api().resolve_url("files/a.mp4"), "http://localhost:5000/files/a.mp4");
    }

    #[test]
    fn absolute_video_url_is_untouched() {
        assert_eq!(api().resolve_url("https://cdn/x.mp4"), "https://cdn/x.mp4");
    }

    #[test]
    fn download_url_points_at_download_endpoint() {
        assert_eq!(api().download_url("abc"), "http://localhost:5000/api/download/abc");
    }

    #[test]
    fn server_message_only_for_api_errors() {
        let err = ApiError::Api {
            status: 400,
            body: r#"{"error":"youtube_url is required"}"#.into(),
            message: Some("youtube_url is required".into()),
        };
        assert_eq!(err.server_message(), Some("youtube_url is required"));
        assert_eq!(err.status(), Some(400));

        let malformed = ApiError::from(serde_json::from_str::<Job>("{").unwrap_err());
        assert_eq!(malformed.server_message(), None);
        assert_eq!(malformed.status(), None);
    }
}
