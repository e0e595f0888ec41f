//! Worker wire format.
//!
//! Each message is one JSON object on its own line:
//!
//! ```json
//! {"id": 3, "type": "analyze", "payload": {"text": "...", "keyword": "garden"}}
//! ```
//!
//! Requests are `initialize`, `analyze`, `cancel` and `terminate`; the
//! worker answers with `result` or `error`, echoing the request id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assessor::AssessorKind;
use crate::config::AnalysisConfig;
use crate::error::{ProtocolError, WorkerError};
use crate::paper::PaperInput;

/// The `payload` of an `analyze` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The paper fields.
    #[serde(flatten)]
    pub paper: PaperInput,
    /// Profile to run instead of the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<AssessorKind>,
}

/// Broad class of an `error` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The configuration was rejected.
    Config,
    /// The request could not be decoded.
    Protocol,
    /// The request is not valid in the worker's current state.
    State,
    /// The worker was terminated.
    Terminated,
}

/// The `payload` of an `error` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error class.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&WorkerError> for ErrorPayload {
    fn from(error: &WorkerError) -> Self {
        let kind = match error {
            WorkerError::Config(_) => ErrorKind::Config,
            WorkerError::Protocol(_) => ErrorKind::Protocol,
            WorkerError::Terminated => ErrorKind::Terminated,
            _ => ErrorKind::State,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// A decoded message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Build the pipeline from this configuration.
    Initialize(Box<AnalysisConfig>),
    /// Analyze a paper.
    Analyze(Box<AnalyzeRequest>),
    /// Abort the analysis in flight.
    Cancel,
    /// Shut the worker down for good.
    Terminate,
    /// A successful response.
    Result(Value),
    /// A failed response.
    Error(ErrorPayload),
}

impl Body {
    /// The `type` tag of this body.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::Analyze(_) => "analyze",
            Self::Cancel => "cancel",
            Self::Terminate => "terminate",
            Self::Result(_) => "result",
            Self::Error(_) => "error",
        }
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Sequence id; responses echo the id of their request.
    pub id: u64,
    /// What the message says.
    pub body: Body,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    id: u64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl Message {
    /// A message with the given id and body.
    pub const fn new(id: u64, body: Body) -> Self {
        Self { id, body }
    }

    /// A `result` response.
    pub const fn result(id: u64, payload: Value) -> Self {
        Self::new(id, Body::Result(payload))
    }

    /// An `error` response describing `error`.
    pub fn error(id: u64, error: &WorkerError) -> Self {
        Self::new(id, Body::Error(error.into()))
    }

    /// Decode one line.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        let invalid = |source| ProtocolError::InvalidPayload {
            kind: envelope.kind.clone(),
            source,
        };
        let body = match envelope.kind.as_str() {
            "initialize" => {
                Body::Initialize(serde_json::from_value(envelope.payload.clone()).map_err(invalid)?)
            }
            "analyze" => {
                Body::Analyze(serde_json::from_value(envelope.payload.clone()).map_err(invalid)?)
            }
            "cancel" => Body::Cancel,
            "terminate" => Body::Terminate,
            "result" => Body::Result(envelope.payload.clone()),
            "error" => {
                Body::Error(serde_json::from_value(envelope.payload.clone()).map_err(invalid)?)
            }
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        };
        Ok(Self {
            id: envelope.id,
            body,
        })
    }

    /// Encode as a single line, without the trailing newline.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let payload = match &self.body {
            Body::Initialize(config) => serde_json::to_value(config)?,
            Body::Analyze(request) => serde_json::to_value(request)?,
            Body::Cancel | Body::Terminate => Value::Null,
            Body::Result(value) => value.clone(),
            Body::Error(error) => serde_json::to_value(error)?,
        };
        let envelope = Envelope {
            id: self.id,
            kind: self.body.kind().to_string(),
            payload,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

/// Best-effort id of a line that failed to decode, 0 when there is none.
pub fn salvage_id(line: &str) -> u64 {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|value| value.get("id")?.as_u64())
        .unwrap_or(0)
}
