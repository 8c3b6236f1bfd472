//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use autodub_client::events::JobEvent;
use autodub_client::poller::{PollOutcome, PollSubscription};
use autodub_client::roster::RosterObserver;
use autodub_client::session::DubbingSession;
use autodub_core::roster::RosterView;
use autodub_core::submission::DubForm;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::render;

/// Submit a job and, unless `detach` is set, follow it to completion.
pub async fn submit(
    session: &DubbingSession,
    events: broadcast::Receiver<JobEvent>,
    form: DubForm,
    detach: bool,
) -> anyhow::Result<()> {
    warn_if_unhealthy(session).await;

    let (handle, subscription) = session.submit_and_track(&form).await?;
    println!("Created dubbing job {}", handle.job_id);
    if let Some(message) = &handle.message {
        println!("{message}");
    }

    if detach {
        session.reset().await;
        println!("Check progress with `autodub watch {}`", handle.job_id);
        return Ok(());
    }

    session.watch_roster(Arc::new(RosterLog)).await;
    finish(follow(session, events, &subscription).await?, &handle.job_id)
}

/// Follow an existing job until it completes, fails or Ctrl-C.
pub async fn watch(
    session: &DubbingSession,
    events: broadcast::Receiver<JobEvent>,
    job_id: &str,
) -> anyhow::Result<()> {
    let subscription = session.select_job(job_id).await;
    session.watch_roster(Arc::new(RosterLog)).await;
    finish(follow(session, events, &subscription).await?, job_id)
}

/// Print the roster, most recent first.
pub async fn jobs(session: &DubbingSession) -> anyhow::Result<()> {
    let view = session.refresh_roster().await?;
    print!("{}", render::roster_table(&view));
    if view.is_empty() {
        println!();
    }
    Ok(())
}

pub async fn health(session: &DubbingSession) -> anyhow::Result<()> {
    let status = session.check_health().await;
    println!("Dubbing service is {status}");
    if !status.is_healthy() {
        anyhow::bail!("dubbing service is not healthy");
    }
    Ok(())
}

/// Download a finished job's video to `output`, or
/// `dubbed_video_{job_id}.mp4` in the working directory.
pub async fn download(
    session: &DubbingSession,
    job_id: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(|| default_download_path(job_id));
    let bytes = session
        .download(job_id)
        .await
        .with_context(|| format!("Failed to download video for job {job_id}"))?;

    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(job_id, path = %path.display(), bytes = bytes.len(), "Video downloaded");
    println!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub fn default_download_path(job_id: &str) -> PathBuf {
    PathBuf::from(format!("dubbed_video_{job_id}.mp4"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Roster refreshes while following a job are only logged; `jobs` prints
/// the table.
struct RosterLog;

impl RosterObserver for RosterLog {
    fn on_roster(&self, view: &RosterView) {
        tracing::debug!(jobs = view.entries().len(), "Job roster refreshed");
    }
}

async fn warn_if_unhealthy(session: &DubbingSession) {
    let status = session.check_health().await;
    if !status.is_healthy() {
        eprintln!("Warning: {status}. Submitting anyway.");
    }
}

/// Print events for `subscription` until it ends. Ctrl-C resets the
/// session and returns [`PollOutcome::Cancelled`].
async fn follow(
    session: &DubbingSession,
    mut events: broadcast::Receiver<JobEvent>,
    subscription: &PollSubscription,
) -> anyhow::Result<PollOutcome> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                session.reset().await;
                println!("Stopped watching job {}", subscription.job_id());
                return Ok(PollOutcome::Cancelled);
            }
            event = events.recv() => match event {
                Ok(event) if event.subscription() != subscription.id() => {}
                Ok(event) => {
                    if let Some(line) = render::event_line(&event, |p| session.artifact_url(p)) {
                        println!("{line}");
                    }
                    if event.is_terminal() {
                        return Ok(subscription.finished().await);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged, some progress lines were dropped");
                }
                Err(RecvError::Closed) => return Ok(subscription.finished().await),
            }
        }
    }
}

fn finish(outcome: PollOutcome, job_id: &str) -> anyhow::Result<()> {
    match outcome {
        PollOutcome::Failed => anyhow::bail!("job {job_id} failed"),
        PollOutcome::Completed | PollOutcome::Cancelled => Ok(()),
    }
}
