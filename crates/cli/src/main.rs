//! `autodub` -- command-line client for the AutoDub dubbing service.
//!
//! Submits dubbing jobs, follows their progress and lists past jobs.
//!
//! # Environment variables
//!
//! | Variable                       | Default                 | Description                       |
//! |--------------------------------|-------------------------|-----------------------------------|
//! | `AUTODUB_API_URL`              | `http://localhost:5000` | Base URL of the dubbing service   |
//! | `AUTODUB_POLL_INTERVAL_MS`     | `2000`                  | Delay between status polls        |
//! | `AUTODUB_REQUEST_TIMEOUT_SECS` | `30`                    | Upper bound on any HTTP request   |
//! | `AUTODUB_ROSTER_REFRESH_SECS`  | `10`                    | Background roster refresh period  |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use autodub_cli::commands;
use autodub_client::api::DubbingApi;
use autodub_client::config::ClientConfig;
use autodub_client::events::BroadcastObserver;
use autodub_client::session::DubbingSession;
use autodub_core::submission::DubForm;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "autodub", about = "Dub online videos into another language")]
struct Cli {
    /// Base URL of the dubbing service; overrides `AUTODUB_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Delay between status polls; overrides `AUTODUB_POLL_INTERVAL_MS`.
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a dubbing job and follow it until it finishes.
    Submit {
        /// Source video URL.
        url: String,

        /// Target language code, e.g. `es`.
        #[arg(long, short)]
        lang: String,

        /// Clip start, in whole seconds.
        #[arg(long)]
        start: Option<String>,

        /// Clip end, in whole seconds.
        #[arg(long)]
        end: Option<String>,

        /// Print the job id and exit without polling.
        #[arg(long)]
        detach: bool,
    },

    /// Follow an existing job.
    Watch { job_id: String },

    /// List jobs, most recent first.
    Jobs,

    /// Probe the service health endpoint.
    Health,

    /// Download a finished job's dubbed video.
    Download {
        job_id: String,

        /// Output file (default: `dubbed_video_{job_id}.mp4`).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autodub_cli=info,autodub_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    config.validate()?;

    tracing::debug!(api_url = %config.api_url, "Starting autodub");

    let api = DubbingApi::new(config.api_url.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?;
    let observer = Arc::new(BroadcastObserver::default());
    let events = observer.subscribe();
    let session = DubbingSession::new(Arc::new(api), observer, config);

    let result = match cli.command {
        Command::Submit {
            url,
            lang,
            start,
            end,
            detach,
        } => {
            let mut form = DubForm::new(url, lang);
            if let Some(start) = start {
                form = form.with_start_time(start);
            }
            if let Some(end) = end {
                form = form.with_end_time(end);
            }
            commands::submit(&session, events, form, detach).await
        }
        Command::Watch { job_id } => commands::watch(&session, events, &job_id).await,
        Command::Jobs => commands::jobs(&session).await,
        Command::Health => commands::health(&session).await,
        Command::Download { job_id, output } => {
            commands::download(&session, &job_id, output).await
        }
    };

    session.shutdown().await;
    result
}
