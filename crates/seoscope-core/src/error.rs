//! Error types for seoscope-core.

use thiserror::Error;

use crate::assessor::AssessorKind;

/// Errors that can occur when loading configuration or initializing a pipeline.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// The locale string is not of the form `ll`, `ll_CC` or `ll-CC`.
    #[error("malformed locale: {0:?}")]
    InvalidLocale(String),

    /// No language pack exists for the locale and fallback is disabled.
    #[error("unsupported locale {locale:?} and locale fallback is disabled")]
    UnsupportedLocale {
        /// The requested locale.
        locale: String,
    },

    /// An override names an assessment that no configured profile contains.
    #[error("override targets unknown assessment {identifier:?}")]
    UnknownAssessment {
        /// The assessment identifier from the override.
        identifier: String,
    },

    /// A threshold override is not usable.
    #[error("malformed override {identifier}.{boundary}: {reason}")]
    MalformedOverride {
        /// The assessment identifier.
        identifier: String,
        /// The boundary name.
        boundary: String,
        /// Why the override was rejected.
        reason: String,
    },

    /// A custom assessment pattern did not compile.
    #[error("custom assessment {identifier:?} has an invalid pattern: {source}")]
    InvalidPattern {
        /// The custom assessment identifier.
        identifier: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// Registering a custom assessment failed.
    #[error(transparent)]
    Pluggable(#[from] PluggableError),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by an assessment's scoring function.
///
/// The assessor never propagates these: the failing assessment is left out
/// of the report and the error is logged.
#[derive(Error, Debug)]
pub enum AssessmentError {
    /// A research the assessment depends on is not registered.
    #[error("{assessment}: research {research:?} is not available")]
    MissingResearch {
        /// The assessment identifier.
        assessment: String,
        /// The research name.
        research: &'static str,
    },

    /// A research returned a fact of an unexpected shape.
    #[error("{assessment}: research {research:?} returned an unexpected fact")]
    UnexpectedFact {
        /// The assessment identifier.
        assessment: String,
        /// The research name.
        research: &'static str,
    },

    /// A plugin assessment reported a failure.
    #[error("{assessment}: {message}")]
    Failed {
        /// The assessment identifier.
        assessment: String,
        /// Description of the failure.
        message: String,
    },
}

/// An assessor run stopped because its cancellation flag was raised.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("analysis cancelled")]
pub struct Cancelled;

/// Errors from the extension registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluggableError {
    /// A plugin with this name is already registered.
    #[error("plugin {0:?} is already registered")]
    DuplicatePlugin(String),

    /// The plugin has not been registered.
    #[error("plugin {0:?} is not registered")]
    UnknownPlugin(String),

    /// An assessment with this identifier already exists for the assessor.
    #[error("assessment {identifier:?} is already registered for the {assessor} assessor")]
    DuplicateAssessment {
        /// The assessor kind.
        assessor: AssessorKind,
        /// The duplicate identifier.
        identifier: String,
    },
}

/// A content filter could not transform its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("filter failed: {0}")]
pub struct FilterError(pub String);

/// Errors from decoding worker protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The line is not a JSON envelope.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope names an unknown message type.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The payload does not match the message type.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        /// The message type.
        kind: String,
        /// The payload decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the worker and its client.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// `analyze` was requested before a successful `initialize`.
    #[error("worker is not initialized")]
    NotInitialized,

    /// `cancel` was requested while no analysis was running.
    #[error("no analysis is in progress")]
    NotAnalyzing,

    /// The worker was terminated.
    #[error("worker terminated")]
    Terminated,

    /// The worker rejected its configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A message could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The request was dropped because a cancel aborted it.
    #[error("request {id} was cancelled")]
    Cancelled {
        /// Sequence id of the cancelled request.
        id: u64,
    },

    /// No response arrived within the configured timeout.
    #[error("request {id} timed out after {after_ms} ms")]
    Timeout {
        /// Sequence id of the request.
        id: u64,
        /// The timeout that elapsed.
        after_ms: u64,
    },

    /// The worker answered with an error message.
    #[error("request {id} failed: {message}")]
    Remote {
        /// Sequence id of the request.
        id: u64,
        /// The error message sent by the worker.
        message: String,
    },

    /// The worker answered with an unexpected message type.
    #[error("request {id} received an unexpected response")]
    UnexpectedResponse {
        /// Sequence id of the request.
        id: u64,
    },
}

/// Result type alias using [`WorkerError`].
pub type WorkerResult<T> = Result<T, WorkerError>;
