//! Job snapshot as reported by the dubbing service.
//!
//! The client never mutates a [`Job`]; it only observes successive
//! snapshots returned by `GET /api/dub/{job_id}` and `GET /api/jobs`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a remote job.
///
/// The set is open: the service reports intermediate pipeline stages
/// (e.g. `"transcribing"`) that are kept verbatim in [`JobStatus::Other`]
/// and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Pending,
    Processing,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }

    /// `completed` and `failed` are the only states with no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => Self::Queued,
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Fallback text for a failed job that carries no message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Job failed";

/// One unit of remote dubbing work, as last observed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Raw percentage from the server. May be absent, regress, or fall
    /// outside `0..=100`; use [`Job::progress_percent`] for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    /// Source video URL echoed back from the submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    /// Artifact path, only present once the job has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Job {
    /// A bare snapshot with only the id and status set.
    pub fn new(job_id: impl Into<JobId>, status: impl Into<JobStatus>) -> Self {
        Self {
            job_id: job_id.into(),
            status: status.into(),
            progress: None,
            message: None,
            target_language: None,
            youtube_url: None,
            video_url: None,
            created_at: None,
        }
    }

    pub fn with_progress(mut self, progress: i64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_video_url(mut self, video_url: impl Into<String>) -> Self {
        self.video_url = Some(video_url.into());
        self
    }

    /// Progress clamped into `0..=100`, with a missing value reading as 0.
    pub fn progress_percent(&self) -> u8 {
        self.progress.unwrap_or(0).clamp(0, 100) as u8
    }

    /// The status message, treating an empty string as absent.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }

    /// Message to surface when the job has failed.
    pub fn failure_message(&self) -> &str {
        self.message().unwrap_or(DEFAULT_FAILURE_MESSAGE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
