//! Worker orchestration.
//!
//! A worker hosts a [`Pipeline`] behind a message channel. The dispatcher is
//! an async task that owns all worker state; each analysis runs on a
//! blocking thread with the pipeline moved into it, so at most one run is in
//! flight and queued requests wait their turn in FIFO order.
//!
//! State machine: `Uninitialized → Ready → Analyzing → Ready | Terminated`.
//!
//! - `initialize` builds a new pipeline. While anything is running or queued
//!   it waits in the queue like an analysis.
//! - `analyze` is queued and answered with a `result` carrying the report.
//! - `cancel` raises the in-flight run's cancellation flag. Neither the
//!   cancel nor the aborted analysis gets a response.
//! - `terminate` fails everything pending with a "worker terminated" error,
//!   answers itself with a `result`, and every later request gets an error.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::assessor::{AssessorKind, CancellationFlag};
use crate::config::AnalysisConfig;
use crate::error::{Cancelled, ProtocolError, WorkerError};
use crate::paper::Paper;
use crate::pipeline::{AnalysisReport, Pipeline};
use crate::pluggable::Pluggable;

pub mod client;
pub mod protocol;

pub use client::{Freshness, ResponseTracker, WorkerClient};
pub use protocol::{AnalyzeRequest, Body, ErrorKind, ErrorPayload, Message};

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No pipeline yet, or the last `initialize` failed.
    Uninitialized,
    /// Waiting for work.
    Ready,
    /// An analysis is in flight.
    Analyzing,
    /// Shut down; every request fails.
    Terminated,
}

/// Channels to a spawned worker.
#[derive(Debug)]
pub struct WorkerChannels {
    /// Send requests here. Dropping it lets the worker finish queued work
    /// and exit.
    pub requests: mpsc::UnboundedSender<Message>,
    /// Responses, in completion order.
    pub responses: mpsc::UnboundedReceiver<Message>,
    /// The dispatcher task.
    pub task: JoinHandle<()>,
}

/// Spawn a worker on the current tokio runtime.
///
/// Plugin assessments and filters registered on `pluggable` apply to every
/// pipeline the worker builds.
pub fn spawn(pluggable: Arc<Pluggable>) -> WorkerChannels {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(pluggable, response_tx);
    let task = tokio::spawn(dispatcher.run(request_rx));
    WorkerChannels {
        requests: request_tx,
        responses: response_rx,
        task,
    }
}

enum Queued {
    Initialize(u64, Box<AnalysisConfig>),
    Analyze(u64, Box<AnalyzeRequest>),
}

impl Queued {
    const fn id(&self) -> u64 {
        match self {
            Self::Initialize(id, _) | Self::Analyze(id, _) => *id,
        }
    }
}

struct InFlight {
    id: u64,
    cancel: CancellationFlag,
}

type RunOutput = (Pipeline, Result<AnalysisReport, Cancelled>);

struct Completion {
    id: u64,
    joined: Result<RunOutput, JoinError>,
}

struct Dispatcher {
    state: WorkerState,
    pipeline: Option<Pipeline>,
    pluggable: Arc<Pluggable>,
    queue: VecDeque<Queued>,
    in_flight: Option<InFlight>,
    responses: mpsc::UnboundedSender<Message>,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Dispatcher {
    fn new(pluggable: Arc<Pluggable>, responses: mpsc::UnboundedSender<Message>) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            state: WorkerState::Uninitialized,
            pipeline: None,
            pluggable,
            queue: VecDeque::new(),
            in_flight: None,
            responses,
            done_tx,
            done_rx,
        }
    }

    async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Message>) {
        let mut open = true;
        loop {
            tokio::select! {
                request = requests.recv(), if open => match request {
                    Some(message) => self.handle(message),
                    None => {
                        tracing::debug!("request channel closed");
                        open = false;
                    }
                },
                Some(completion) = self.done_rx.recv() => self.complete(completion),
            }
            if !open && self.in_flight.is_none() && self.queue.is_empty() {
                break;
            }
        }
        tracing::debug!(state = ?self.state, "worker stopped");
    }

    fn respond(&self, message: Message) {
        // The receiver is gone only when nobody is listening any more.
        if self.responses.send(message).is_err() {
            tracing::debug!("response dropped, receiver closed");
        }
    }

    fn fail(&self, id: u64, error: &WorkerError) {
        tracing::debug!(id, %error, "request failed");
        self.respond(Message::error(id, error));
    }

    #[tracing::instrument(skip_all, fields(id = message.id, kind = message.body.kind()))]
    fn handle(&mut self, message: Message) {
        let Message { id, body } = message;
        if self.state == WorkerState::Terminated {
            self.fail(id, &WorkerError::Terminated);
            return;
        }
        match body {
            Body::Initialize(config) => {
                self.queue.push_back(Queued::Initialize(id, config));
                self.pump();
            }
            Body::Analyze(request) => {
                let initializing = self
                    .queue
                    .iter()
                    .any(|q| matches!(q, Queued::Initialize(..)));
                if self.pipeline.is_none() && self.in_flight.is_none() && !initializing {
                    self.fail(id, &WorkerError::NotInitialized);
                    return;
                }
                self.queue.push_back(Queued::Analyze(id, request));
                self.pump();
            }
            Body::Cancel => match &self.in_flight {
                Some(run) => {
                    tracing::debug!(cancelled = run.id, "cancelling analysis");
                    run.cancel.cancel();
                }
                None => self.fail(id, &WorkerError::NotAnalyzing),
            },
            Body::Terminate => self.terminate(id),
            other @ (Body::Result(_) | Body::Error(_)) => {
                let error =
                    ProtocolError::UnknownType(format!("{} is not a request", other.kind()));
                self.fail(id, &WorkerError::from(error));
            }
        }
    }

    fn terminate(&mut self, id: u64) {
        tracing::info!(id, "terminating worker");
        self.state = WorkerState::Terminated;
        self.pipeline = None;
        if let Some(run) = self.in_flight.take() {
            run.cancel.cancel();
            self.fail(run.id, &WorkerError::Terminated);
        }
        for queued in std::mem::take(&mut self.queue) {
            self.fail(queued.id(), &WorkerError::Terminated);
        }
        self.respond(Message::result(id, json!({ "terminated": true })));
    }

    /// Start queued work until something is in flight or the queue is empty.
    fn pump(&mut self) {
        while self.in_flight.is_none() && self.state != WorkerState::Terminated {
            let Some(next) = self.queue.pop_front() else {
                break;
            };
            match next {
                Queued::Initialize(id, config) => self.initialize(id, *config),
                Queued::Analyze(id, request) => self.start(id, *request),
            }
        }
    }

    fn initialize(&mut self, id: u64, config: AnalysisConfig) {
        match Pipeline::with_pluggable(config, Arc::clone(&self.pluggable)) {
            Ok(pipeline) => {
                let language = pipeline.language();
                let payload = json!({
                    "language": language.code,
                    "languageName": language.name,
                    "profile": pipeline.config().profile,
                    "profiles": AssessorKind::ALL,
                });
                self.pipeline = Some(pipeline);
                self.state = WorkerState::Ready;
                tracing::info!(id, language = language.name, "worker initialized");
                self.respond(Message::result(id, payload));
            }
            Err(error) => {
                self.pipeline = None;
                self.state = WorkerState::Uninitialized;
                self.fail(id, &WorkerError::from(error));
            }
        }
    }

    fn start(&mut self, id: u64, request: AnalyzeRequest) {
        let Some(mut pipeline) = self.pipeline.take() else {
            self.fail(id, &WorkerError::NotInitialized);
            return;
        };
        let profile = request.profile.unwrap_or(pipeline.config().profile);
        let cancel = CancellationFlag::new();
        let flag = cancel.clone();
        let done = self.done_tx.clone();

        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let paper = Paper::new(request.paper);
                let outcome = pipeline.run(&paper, profile, &flag);
                (pipeline, outcome)
            })
            .await;
            if done.send(Completion { id, joined }).is_err() {
                tracing::debug!(id, "run finished after the dispatcher stopped, result dropped");
            }
        });

        tracing::debug!(id, %profile, "analysis started");
        self.state = WorkerState::Analyzing;
        self.in_flight = Some(InFlight { id, cancel });
    }

    fn complete(&mut self, completion: Completion) {
        let Completion { id, joined } = completion;
        if self.state == WorkerState::Terminated {
            tracing::debug!(id, "discarding run finished after termination");
            return;
        }
        self.in_flight = None;
        match joined {
            Ok((pipeline, outcome)) => {
                self.pipeline = Some(pipeline);
                self.state = WorkerState::Ready;
                match outcome {
                    Ok(report) => match serde_json::to_value(&report) {
                        Ok(payload) => self.respond(Message::result(id, payload)),
                        Err(error) => self.fail(id, &WorkerError::from(ProtocolError::Json(error))),
                    },
                    Err(Cancelled) => tracing::debug!(id, "analysis cancelled, no response"),
                }
            }
            Err(error) => {
                tracing::error!(id, %error, "analysis thread failed, pipeline lost");
                self.state = WorkerState::Uninitialized;
                self.fail(id, &WorkerError::NotInitialized);
            }
        }
        self.pump();
    }
}

/// Serve the worker protocol over JSON lines until `reader` is exhausted.
///
/// With `preload`, the worker is initialized from it as request 0 before any
/// input is read. Lines that fail to decode are answered with an `error`
/// carrying their id, or 0. Blank lines are ignored. Remaining work is
/// finished after the input ends.
pub async fn serve_lines<R, W>(
    pluggable: Arc<Pluggable>,
    preload: Option<AnalysisConfig>,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let WorkerChannels {
        requests,
        mut responses,
        task,
    } = spawn(pluggable);
    if let Some(config) = preload {
        // The worker is alive until `requests` is dropped.
        let _ = requests.send(Message::new(0, Body::Initialize(Box::new(config))));
    }
    let (local_tx, mut local_rx) = mpsc::unbounded_channel::<Message>();

    let read = async move {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match Message::decode(&line) {
                Ok(message) => {
                    if requests.send(message).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    let id = protocol::salvage_id(&line);
                    tracing::warn!(id, %error, "undecodable request");
                    let _ = local_tx.send(Message::error(id, &WorkerError::from(error)));
                }
            }
        }
        Ok::<_, std::io::Error>(())
    };

    let write = async {
        loop {
            let message = tokio::select! {
                Some(message) = responses.recv() => message,
                Some(message) = local_rx.recv() => message,
                else => break,
            };
            let line = message
                .encode()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (read, write) = tokio::join!(read, write);
    if let Err(error) = task.await {
        tracing::error!(%error, "worker task failed");
    }
    read.and(write)
}
