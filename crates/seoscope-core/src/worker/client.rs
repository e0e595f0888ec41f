//! Caller side of the worker protocol.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::protocol::{AnalyzeRequest, Body, ErrorKind, Message};
use super::{WorkerChannels, spawn};
use crate::assessor::AssessorKind;
use crate::config::AnalysisConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::paper::PaperInput;
use crate::pipeline::AnalysisReport;
use crate::pluggable::Pluggable;

/// Whether a response is still the latest one the caller cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No newer request has been issued or answered.
    Current,
    /// A newer request exists; this response can be discarded.
    Stale,
}

/// Last-request-wins bookkeeping, by sequence id.
///
/// Arrival order says nothing: a slow response for id 5 can land after the
/// response for id 7, and it is stale either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTracker {
    newest: u64,
}

impl ResponseTracker {
    /// A tracker that has seen nothing.
    pub const fn new() -> Self {
        Self { newest: 0 }
    }

    /// Record that a request with `id` was sent.
    pub fn issued(&mut self, id: u64) {
        self.newest = self.newest.max(id);
    }

    /// Classify a response without recording it.
    pub const fn classify(&self, id: u64) -> Freshness {
        if id < self.newest {
            Freshness::Stale
        } else {
            Freshness::Current
        }
    }

    /// Classify a response and record it.
    pub fn accept(&mut self, id: u64) -> Freshness {
        let freshness = self.classify(id);
        self.newest = self.newest.max(id);
        freshness
    }

    /// The highest id seen.
    pub const fn newest(&self) -> u64 {
        self.newest
    }
}

/// A finished analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Sequence id of the request.
    pub id: u64,
    /// The report.
    pub report: AnalysisReport,
    /// Whether a newer analysis was issued meanwhile.
    pub freshness: Freshness,
}

type Reply = oneshot::Sender<WorkerResult<Value>>;
type Pending = Arc<Mutex<HashMap<u64, (&'static str, Reply)>>>;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Typed handle to a worker: allocates ids, waits for the matching response
/// and enforces a per-request timeout.
#[derive(Debug)]
pub struct WorkerClient {
    requests: mpsc::UnboundedSender<Message>,
    pending: Pending,
    next_id: AtomicU64,
    timeout: Duration,
    tracker: Mutex<ResponseTracker>,
    router: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl WorkerClient {
    /// Spawn a worker and connect to it.
    pub fn spawn(pluggable: Arc<Pluggable>, timeout: Duration) -> Self {
        Self::connect(spawn(pluggable), timeout)
    }

    /// Connect to an already spawned worker.
    pub fn connect(channels: WorkerChannels, timeout: Duration) -> Self {
        let WorkerChannels {
            requests,
            responses,
            task,
        } = channels;
        let pending: Pending = Arc::default();
        let router = tokio::spawn(route(responses, Arc::clone(&pending)));
        Self {
            requests,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            tracker: Mutex::new(ResponseTracker::new()),
            router,
            worker: task,
        }
    }

    /// Build the worker's pipeline. Returns the worker's description of it.
    pub async fn initialize(&self, config: AnalysisConfig) -> WorkerResult<Value> {
        let (_, value) = self.request(Body::Initialize(Box::new(config))).await?;
        Ok(value)
    }

    /// Analyze a paper, with `profile` or the configured default.
    pub async fn analyze(
        &self,
        paper: PaperInput,
        profile: Option<AssessorKind>,
    ) -> WorkerResult<Analysis> {
        let body = Body::Analyze(Box::new(AnalyzeRequest { paper, profile }));
        let (id, value) = self.request(body).await?;
        let report = serde_json::from_value(value)
            .map_err(|_| WorkerError::UnexpectedResponse { id })?;
        let freshness = lock(&self.tracker).accept(id);
        Ok(Analysis {
            id,
            report,
            freshness,
        })
    }

    /// Ask the worker to abort the analysis in flight. Returns the cancel's id.
    ///
    /// Nothing answers a successful cancel; the aborted `analyze` resolves as
    /// [`WorkerError::Cancelled`] once a later request is answered.
    pub fn cancel(&self) -> WorkerResult<u64> {
        let id = self.allocate();
        self.requests
            .send(Message::new(id, Body::Cancel))
            .map_err(|_| WorkerError::Terminated)?;
        Ok(id)
    }

    /// Shut the worker down. Pending requests fail with
    /// [`WorkerError::Terminated`].
    pub async fn terminate(&self) -> WorkerResult<()> {
        self.request(Body::Terminate).await.map(|_| ())
    }

    /// Snapshot of the stale-response bookkeeping.
    pub fn tracker(&self) -> ResponseTracker {
        *lock(&self.tracker)
    }

    /// Close the request channel and wait for the worker to finish its
    /// queued work.
    pub async fn shutdown(self) {
        let Self {
            requests,
            router,
            worker,
            ..
        } = self;
        drop(requests);
        if let Err(error) = worker.await {
            tracing::error!(%error, "worker task failed");
        }
        if let Err(error) = router.await {
            tracing::error!(%error, "response router failed");
        }
    }

    fn allocate(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn request(&self, body: Body) -> WorkerResult<(u64, Value)> {
        let id = self.allocate();
        let kind = body.kind();
        let (reply, response) = oneshot::channel();
        lock(&self.pending).insert(id, (kind, reply));
        if matches!(body, Body::Analyze(_)) {
            lock(&self.tracker).issued(id);
        }
        if self.requests.send(Message::new(id, body)).is_err() {
            lock(&self.pending).remove(&id);
            return Err(WorkerError::Terminated);
        }
        tracing::trace!(id, kind, "request sent");

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result.map(|value| (id, value)),
            // Router gone: the worker stopped without answering.
            Ok(Err(_)) => Err(WorkerError::Terminated),
            Err(_) => {
                lock(&self.pending).remove(&id);
                let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(id, kind, after_ms, "request timed out");
                Err(WorkerError::Timeout { id, after_ms })
            }
        }
    }
}

/// Deliver responses to their waiting requests until the worker goes away.
async fn route(mut responses: mpsc::UnboundedReceiver<Message>, pending: Pending) {
    while let Some(Message { id, body }) = responses.recv().await {
        let mut waiting = lock(&pending);
        let Some((kind, reply)) = waiting.remove(&id) else {
            tracing::debug!(id, kind = body.kind(), "response without a waiting request");
            continue;
        };

        // The queue is FIFO, so an older analysis still waiting when a newer
        // request is answered was aborted by a cancel.
        let skipped: Vec<u64> = waiting
            .iter()
            .filter(|&(&other, &(other_kind, _))| other < id && other_kind == "analyze")
            .map(|(&other, _)| other)
            .collect();
        for other in skipped {
            if let Some((_, reply)) = waiting.remove(&other) {
                tracing::debug!(id = other, "analysis was cancelled");
                let _ = reply.send(Err(WorkerError::Cancelled { id: other }));
            }
        }
        drop(waiting);

        let result = match body {
            Body::Result(value) => Ok(value),
            Body::Error(payload) if payload.kind == ErrorKind::Terminated => {
                Err(WorkerError::Terminated)
            }
            Body::Error(payload) => Err(WorkerError::Remote {
                id,
                message: payload.message,
            }),
            _ => Err(WorkerError::UnexpectedResponse { id }),
        };
        tracing::trace!(id, kind, ok = result.is_ok(), "response routed");
        // The requester may have timed out and stopped listening.
        let _ = reply.send(result);
    }
    // Dropping the remaining senders fails their requests as terminated.
    lock(&pending).clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WorkerClient {
        WorkerClient::spawn(Arc::new(Pluggable::new()), Duration::from_secs(10))
    }

    fn paper(text: &str) -> PaperInput {
        PaperInput {
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn late_response_for_older_request_is_stale() {
        let mut tracker = ResponseTracker::new();
        tracker.issued(5);
        tracker.issued(7);
        assert_eq!(tracker.accept(7), Freshness::Current);
        assert_eq!(tracker.accept(5), Freshness::Stale);
        assert_eq!(tracker.newest(), 7);
    }

    #[test]
    fn issuing_a_newer_request_makes_pending_responses_stale() {
        let mut tracker = ResponseTracker::new();
        tracker.issued(3);
        assert_eq!(tracker.classify(3), Freshness::Current);
        tracker.issued(4);
        assert_eq!(tracker.classify(3), Freshness::Stale);
        assert_eq!(tracker.classify(4), Freshness::Current);
    }

    #[tokio::test]
    async fn analyze_round_trip() {
        let client = client();
        let ready = client.initialize(AnalysisConfig::default()).await.unwrap();
        assert_eq!(ready["language"], "en");

        let analysis = client
            .analyze(paper("A short text."), Some(AssessorKind::Readability))
            .await
            .unwrap();
        assert_eq!(analysis.id, 2);
        assert_eq!(analysis.freshness, Freshness::Current);
        assert_eq!(analysis.report.profile, AssessorKind::Readability);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn ids_increase_monotonically() {
        let client = client();
        client.initialize(AnalysisConfig::default()).await.unwrap();
        let first = client.analyze(paper("One."), None).await.unwrap();
        let cancel = client.cancel().unwrap();
        let second = client.analyze(paper("Two."), None).await.unwrap();
        assert!(first.id < cancel && cancel < second.id);
        assert_eq!(client.tracker().newest(), second.id);
    }

    #[tokio::test]
    async fn analyze_before_initialize_is_remote_error() {
        let client = client();
        let error = client.analyze(paper("Text."), None).await.unwrap_err();
        assert!(matches!(error, WorkerError::Remote { id: 1, .. }));
    }

    #[tokio::test]
    async fn terminate_is_final() {
        let client = client();
        client.initialize(AnalysisConfig::default()).await.unwrap();
        client.terminate().await.unwrap();
        let error = client.analyze(paper("Text."), None).await.unwrap_err();
        assert!(matches!(error, WorkerError::Terminated));
    }

    #[tokio::test]
    async fn times_out_without_a_response() {
        // A worker that never answers.
        let (requests, _inbox) = mpsc::unbounded_channel();
        let (_outbox, responses) = mpsc::unbounded_channel();
        let channels = WorkerChannels {
            requests,
            responses,
            task: tokio::spawn(async {}),
        };
        let client = WorkerClient::connect(channels, Duration::from_millis(20));
        let error = client.initialize(AnalysisConfig::default()).await.unwrap_err();
        assert!(matches!(
            error,
            WorkerError::Timeout {
                id: 1,
                after_ms: 20
            }
        ));
    }

    #[tokio::test]
    async fn skipped_analysis_resolves_as_cancelled() {
        // Scripted worker: drops request 1 as if cancelled, answers 2.
        let (requests, mut inbox) = mpsc::unbounded_channel::<Message>();
        let (outbox, responses) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                if message.id == 2 {
                    let report = serde_json::json!({
                        "profile": "seo",
                        "results": [],
                        "overallScore": 0,
                        "rating": "feedback",
                    });
                    let _ = outbox.send(Message::result(2, report));
                }
            }
        });
        let channels = WorkerChannels {
            requests,
            responses,
            task,
        };
        let client = WorkerClient::connect(channels, Duration::from_secs(10));
        let (first, second) = tokio::join!(
            client.analyze(paper("Old."), None),
            client.analyze(paper("New."), None)
        );
        assert!(matches!(first, Err(WorkerError::Cancelled { id: 1 })));
        let second = second.unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.freshness, Freshness::Current);
    }
}
