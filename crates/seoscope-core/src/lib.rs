//! Core library for seoscope.
//!
//! Content analysis in the style of an SEO plugin's sidebar: a [`Paper`]
//! (text plus metadata) is researched once per run, scored by the
//! assessments of an [`AssessorKind`] profile, and summarized into an
//! [`AnalysisReport`].
//!
//! # Modules
//!
//! - [`paper`] - The analyzed document and its metadata
//! - [`research`] - Memoized text researches, per language
//! - [`assessment`] - Individual scoring rules
//! - [`assessor`] - Profiles and the run state machine
//! - [`pluggable`] - Plugin assessments and content filters
//! - [`pipeline`] - Configured assessors for one language
//! - [`worker`] - Request/response protocol around a pipeline
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use seoscope_core::{AnalysisConfig, Paper, PaperInput, Pipeline};
//!
//! let mut pipeline = Pipeline::new(AnalysisConfig::default())
//!     .expect("default configuration is valid");
//! let paper = Paper::new(PaperInput {
//!     text: "Gardening in small spaces takes planning.".into(),
//!     keyword: "gardening".into(),
//!     ..Default::default()
//! });
//! let report = pipeline.analyze(&paper);
//! println!("{} / 100", report.overall_score);
//! ```
#![deny(unsafe_code)]

pub mod assessment;
pub mod assessor;
pub mod config;
pub mod error;
pub mod language;
pub mod markdown;
pub mod paper;
pub mod pipeline;
pub mod pluggable;
pub mod research;
pub mod text;
pub mod worker;

pub use assessment::{Assessment, AssessmentResult, AssessmentRule, Rating, Score, Verdict};
pub use assessor::{Assessor, AssessorKind, AssessorState, CancellationFlag};
pub use config::{AnalysisConfig, Config, ConfigLoader, ConfigSources, LogLevel};
pub use error::{
    AssessmentError, Cancelled, ConfigError, ConfigResult, PluggableError, ProtocolError,
    WorkerError, WorkerResult,
};
pub use paper::{Paper, PaperInput};
pub use pipeline::{AnalysisReport, Pipeline};
pub use pluggable::{FilterHook, Pluggable};
pub use worker::{WorkerClient, WorkerState};
