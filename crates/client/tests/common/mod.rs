//! Shared test doubles for the client integration tests.
//!
//! [`ScriptedService`] is an in-memory [`JobService`] whose replies are
//! scripted per job; [`RecordingObserver`] captures every callback the
//! polling engine makes.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use autodub_client::api::{ApiError, SubmitResponse};
use autodub_client::events::JobObserver;
use autodub_client::poller::{PollError, SubscriptionId};
use autodub_client::service::JobService;
use autodub_core::job::Job;
use autodub_core::submission::DubRequest;

// ---------------------------------------------------------------------------
// Scripted replies
// ---------------------------------------------------------------------------

/// One scripted reply to a status or list request.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    /// Non-2xx with the given status code.
    Status(u16),
    /// 2xx with a body that does not parse.
    Malformed,
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, ApiError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Status(status) => Err(ApiError::Api {
                status,
                body: String::new(),
                message: None,
            }),
            Reply::Malformed => Err(malformed()),
        }
    }
}

/// Scripted reply to `POST /api/dub`.
#[derive(Debug, Clone)]
pub enum SubmitReply {
    Accepted(String),
    Rejected(u16, Option<String>),
    Malformed,
}

pub fn malformed() -> ApiError {
    ApiError::MalformedBody(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
}

/// Every request the service received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Submit(DubRequest),
    Fetch(String),
    List,
    Health,
    Download(String),
}

type FetchHook = Box<dyn Fn(&str) + Send + Sync>;

// ---------------------------------------------------------------------------
// ScriptedService
// ---------------------------------------------------------------------------

/// In-memory dubbing service.
///
/// Status replies are consumed in order per job; the last one repeats
/// forever once the script runs out.
#[derive(Default)]
pub struct ScriptedService {
    submit_replies: Mutex<VecDeque<SubmitReply>>,
    submit_delay: Mutex<Option<Duration>>,
    status_replies: Mutex<HashMap<String, VecDeque<Reply<Job>>>>,
    fetch_delays: Mutex<HashMap<String, Duration>>,
    list_reply: Mutex<Option<Reply<Vec<Job>>>>,
    health_reply: Mutex<Option<Reply<()>>>,
    calls: Mutex<Vec<Call>>,
    fetch_hook: Mutex<Option<FetchHook>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_submit(&self, reply: SubmitReply) {
        self.submit_replies.lock().unwrap().push_back(reply);
    }

    pub fn delay_submit(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn script_status(&self, job_id: &str, replies: Vec<Reply<Job>>) {
        self.status_replies
            .lock()
            .unwrap()
            .insert(job_id.to_string(), replies.into());
    }

    pub fn delay_fetch(&self, job_id: &str, delay: Duration) {
        self.fetch_delays
            .lock()
            .unwrap()
            .insert(job_id.to_string(), delay);
    }

    pub fn script_list(&self, reply: Reply<Vec<Job>>) {
        *self.list_reply.lock().unwrap() = Some(reply);
    }

    pub fn script_health(&self, reply: Reply<()>) {
        *self.health_reply.lock().unwrap() = Some(reply);
    }

    /// Run `hook` synchronously at the start of every status fetch.
    pub fn on_fetch(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.fetch_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, job_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Fetch(id) if id == job_id))
            .count()
    }

    pub fn submitted(&self) -> Vec<DubRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_status(&self, job_id: &str) -> Reply<Job> {
        let mut replies = self.status_replies.lock().unwrap();
        match replies.get_mut(job_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Status(404)),
            None => Reply::Status(404),
        }
    }
}

#[async_trait]
impl JobService for ScriptedService {
    async fn submit(&self, request: &DubRequest) -> Result<SubmitResponse, ApiError> {
        self.record(Call::Submit(request.clone()));

        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .submit_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SubmitReply::Rejected(500, None));

        match reply {
            SubmitReply::Accepted(job_id) => Ok(SubmitResponse {
                job_id,
                status: Some("queued".into()),
                message: Some("Dubbing job created successfully".into()),
            }),
            SubmitReply::Rejected(status, message) => Err(ApiError::Api {
                status,
                body: String::new(),
                message,
            }),
            SubmitReply::Malformed => Err(malformed()),
        }
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Job, ApiError> {
        self.record(Call::Fetch(job_id.to_string()));
        if let Some(hook) = self.fetch_hook.lock().unwrap().as_ref() {
            hook(job_id);
        }

        let delay = self.fetch_delays.lock().unwrap().get(job_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.next_status(job_id).into_result()
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        self.record(Call::List);
        self.list_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Reply::Ok(Vec::new()))
            .into_result()
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.record(Call::Health);
        self.health_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Reply::Ok(()))
            .into_result()
    }

    async fn download(&self, job_id: &str) -> Result<Vec<u8>, ApiError> {
        self.record(Call::Download(job_id.to_string()));
        Ok(b"video-bytes".to_vec())
    }

    fn artifact_url(&self, path: &str) -> String {
        format!("http://dub.test{path}")
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Update(SubscriptionId, Job),
    Result(SubscriptionId, String, Option<String>),
    Failure(SubscriptionId, String, String),
    Transient(SubscriptionId, String),
}

#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Seen>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Job> {
        self.seen()
            .into_iter()
            .filter_map(|s| match s {
                Seen::Update(_, job) => Some(job),
                _ => None,
            })
            .collect()
    }

    /// Number of result + failure callbacks, across all subscriptions.
    pub fn terminal_count(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Result(..) | Seen::Failure(..)))
            .count()
    }

    pub fn transient_count(&self) -> usize {
        self.seen()
            .iter()
            .filter(|s| matches!(s, Seen::Transient(..)))
            .count()
    }

    /// Every callback made for one subscription.
    pub fn for_subscription(&self, id: SubscriptionId) -> Vec<Seen> {
        self.seen()
            .into_iter()
            .filter(|s| match s {
                Seen::Update(sub, _)
                | Seen::Result(sub, ..)
                | Seen::Failure(sub, ..)
                | Seen::Transient(sub, _) => *sub == id,
            })
            .collect()
    }

    fn push(&self, seen: Seen) {
        self.seen.lock().unwrap().push(seen);
    }
}

impl JobObserver for RecordingObserver {
    fn on_update(&self, subscription: SubscriptionId, job: &Job) {
        self.push(Seen::Update(subscription, job.clone()));
    }

    fn on_result(&self, subscription: SubscriptionId, job_id: &str, video_url: Option<&str>) {
        self.push(Seen::Result(
            subscription,
            job_id.to_string(),
            video_url.map(str::to_string),
        ));
    }

    fn on_failure(&self, subscription: SubscriptionId, job_id: &str, message: &str) {
        self.push(Seen::Failure(
            subscription,
            job_id.to_string(),
            message.to_string(),
        ));
    }

    fn on_transient_error(&self, subscription: SubscriptionId, _job_id: &str, error: &PollError) {
        self.push(Seen::Transient(subscription, error.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Job builders
// ---------------------------------------------------------------------------

pub fn processing(job_id: &str, progress: i64) -> Reply<Job> {
    Reply::Ok(Job::new(job_id, "processing").with_progress(progress))
}

pub fn completed(job_id: &str, video_url: &str) -> Reply<Job> {
    Reply::Ok(
        Job::new(job_id, "completed")
            .with_progress(100)
            .with_video_url(video_url),
    )
}

pub fn failed(job_id: &str, message: &str) -> Reply<Job> {
    Reply::Ok(Job::new(job_id, "failed").with_message(message))
}
