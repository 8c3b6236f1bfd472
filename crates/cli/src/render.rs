//! Plain-text rendering of job events and the roster.

use autodub_client::events::JobEvent;
use autodub_core::job::Job;
use autodub_core::roster::{RosterView, EMPTY_ROSTER_MESSAGE};

/// One progress line, e.g. `[processing]  40% Transcribing audio`.
pub fn progress_line(job: &Job) -> String {
    let mut line = format!("[{}] {:>3}%", job.status.as_str(), job.progress_percent());
    if let Some(message) = job.message() {
        line.push(' ');
        line.push_str(message);
    }
    line
}

/// Render an engine event, resolving artifact paths with `resolve`.
///
/// Transient poll errors are already logged by the engine and render as
/// nothing.
pub fn event_line(event: &JobEvent, resolve: impl Fn(&str) -> String) -> Option<String> {
    match event {
        JobEvent::Updated { job, .. } => Some(progress_line(job)),
        JobEvent::ResultReady {
            video_url: Some(url),
            ..
        } => Some(format!("Dubbed video ready: {}", resolve(url))),
        JobEvent::ResultReady { job_id, .. } => {
            Some(format!("Job {job_id} completed without a video URL"))
        }
        JobEvent::Failed { message, .. } => Some(format!("Dubbing failed: {message}")),
        JobEvent::PollError { .. } => None,
    }
}

/// The roster as a fixed-width table, or the empty-state message.
pub fn roster_table(view: &RosterView) -> String {
    if view.is_empty() {
        return EMPTY_ROSTER_MESSAGE.to_string();
    }

    let mut out = format!("{:<11}  {:<10}  {:<5}  {}\n", "JOB", "STATUS", "LANG", "SOURCE");
    for entry in view.entries() {
        out.push_str(&format!(
            "{:<11}  {:<10}  {:<5}  {}\n",
            entry.short_id,
            entry.status.as_str(),
            entry.language,
            entry.source,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_includes_message_when_present() {
        let job = Job::new("abc123", "processing")
            .with_progress(40)
            .with_message("Transcribing audio");
        assert_eq!(progress_line(&job), "[processing]  40% Transcribing audio");

        let bare = Job::new("abc123", "queued");
        assert_eq!(progress_line(&bare), "[queued]   0%");
    }

    #[test]
    fn result_line_resolves_artifact_path() {
        let event = JobEvent::ResultReady {
            subscription: 1,
            job_id: "abc123".into(),
            video_url: Some("/files/abc123.mp4".into()),
        };
        let line = event_line(&event, |p| format!("http://localhost:5000{p}"));
        assert_eq!(
            line.as_deref(),
            Some("Dubbed video ready: http://localhost:5000/files/abc123.mp4")
        );
    }

    #[test]
    fn poll_errors_render_nothing() {
        let event = JobEvent::PollError {
            subscription: 1,
            job_id: "abc123".into(),
            error: "timed out".into(),
        };
        assert_eq!(event_line(&event, str::to_string), None);
    }

    #[test]
    fn empty_roster_shows_prompt() {
        assert_eq!(roster_table(&RosterView::Empty), EMPTY_ROSTER_MESSAGE);
    }

    #[test]
    fn roster_rows_follow_view_order() {
        let jobs = vec![
            Job::new("0123456789abcdef", "completed"),
            Job::new("fedcba9876543210", "failed"),
        ];
        let table = roster_table(&RosterView::from_jobs(&jobs));
        let rows: Vec<&str> = table.lines().skip(1).collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("01234567..."));
        assert!(rows[0].contains("completed"));
        assert!(rows[1].starts_with("fedcba98..."));
    }
}
