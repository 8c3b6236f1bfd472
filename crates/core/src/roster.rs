//! Ordering and display rules for the historical job roster.

use std::collections::HashSet;

use crate::job::{Job, JobStatus};
use crate::types::JobId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Shown in place of the list when the service knows of no jobs.
pub const EMPTY_ROSTER_MESSAGE: &str = "No jobs yet. Start by creating a new dub!";

/// Number of id characters shown in a roster row.
pub const SHORT_ID_LEN: usize = 8;

/// Source URLs longer than this are truncated for display.
pub const MAX_URL_DISPLAY_LEN: usize = 50;

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Drop duplicate ids (first occurrence wins) and order most-recent-first.
///
/// When every job carries `created_at` the timestamps decide; otherwise
/// the ids are compared in descending lexical order, which only tracks
/// recency for services that issue time-sortable ids.
pub fn order_most_recent_first(jobs: Vec<Job>) -> Vec<Job> {
    let mut seen = HashSet::new();
    let mut jobs: Vec<Job> = jobs
        .into_iter()
        .filter(|job| seen.insert(job.job_id.clone()))
        .collect();

    if jobs.iter().all(|job| job.created_at.is_some()) {
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.job_id.cmp(&a.job_id))
        });
    } else {
        jobs.sort_by(|a, b| b.job_id.cmp(&a.job_id));
    }

    jobs
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// First [`SHORT_ID_LEN`] characters of an id followed by an ellipsis.
pub fn short_id(job_id: &str) -> String {
    let head: String = job_id.chars().take(SHORT_ID_LEN).collect();
    format!("{head}...")
}

/// Truncate a URL to at most [`MAX_URL_DISPLAY_LEN`] characters.
pub fn truncate_url(url: &str) -> String {
    if url.chars().count() <= MAX_URL_DISPLAY_LEN {
        return url.to_string();
    }
    let head: String = url.chars().take(MAX_URL_DISPLAY_LEN - 3).collect();
    format!("{head}...")
}

/// One display row of the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub job_id: JobId,
    pub short_id: String,
    pub status: JobStatus,
    pub language: String,
    pub source: String,
}

impl From<&Job> for RosterEntry {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            short_id: short_id(&job.job_id),
            status: job.status.clone(),
            language: job.target_language.clone().unwrap_or_default(),
            source: job
                .youtube_url
                .as_deref()
                .map(truncate_url)
                .unwrap_or_default(),
        }
    }
}

/// What the roster panel should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterView {
    Empty,
    Jobs(Vec<RosterEntry>),
}

impl RosterView {
    /// Build the view from an already ordered job list.
    pub fn from_jobs(jobs: &[Job]) -> Self {
        if jobs.is_empty() {
            return Self::Empty;
        }
        Self::Jobs(jobs.iter().map(RosterEntry::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn entries(&self) -> &[RosterEntry] {
        match self {
            Self::Empty => &[],
            Self::Jobs(entries) => entries,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
