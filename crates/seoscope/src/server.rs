//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes content analysis over MCP with stdio transport. Analyses go
//! through one lazily started worker, so each waits at most the configured
//! request timeout; listings build a pipeline directly.

use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use seoscope_core::config::Config;
use seoscope_core::{
    AnalysisConfig, AssessmentRule, AssessorKind, PaperInput, Pipeline, Pluggable, WorkerClient,
    WorkerError,
};
use tokio::sync::OnceCell;

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `analyze_content` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AnalyzeContentParams {
    /// The content and its metadata.
    #[serde(flatten)]
    pub paper: PaperInput,
    /// Assessor profile; the configured default when omitted.
    pub profile: Option<AssessorKind>,
}

/// Parameters for the `list_assessments` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListAssessmentsParams {
    /// Assessor profile; the configured default when omitted.
    pub profile: Option<AssessorKind>,
}

/// MCP server exposing content analysis.
#[derive(Clone)]
pub struct ProjectServer {
    config: AnalysisConfig,
    max_input_bytes: Option<usize>,
    timeout: Duration,
    worker: Arc<OnceCell<WorkerClient>>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

fn internal(error: impl std::fmt::Display) -> McpError {
    McpError::internal_error(error.to_string(), None)
}

fn invalid_config(error: impl std::fmt::Display) -> McpError {
    McpError::invalid_params(format!("invalid configuration: {error}"), None)
}

#[tool_router]
impl ProjectServer {
    /// Create a server analyzing with the `analysis` section of `config`.
    ///
    /// The worker starts on the first analysis, not here.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.analysis.clone(),
            max_input_bytes: config.input_limit(),
            timeout: config.request_timeout(),
            worker: Arc::new(OnceCell::new()),
            tool_router: Self::tool_router(),
        }
    }

    fn pipeline(&self) -> Result<Pipeline, McpError> {
        Pipeline::new(self.config.clone()).map_err(invalid_config)
    }

    async fn worker(&self) -> Result<&WorkerClient, McpError> {
        self.worker
            .get_or_try_init(|| async {
                let client = WorkerClient::spawn(Arc::new(Pluggable::new()), self.timeout);
                match client.initialize(self.config.clone()).await {
                    Ok(_) => Ok(client),
                    Err(error) => {
                        client.shutdown().await;
                        // A rejected configuration comes back as a remote error.
                        Err(match error {
                            WorkerError::Remote { message, .. } => invalid_config(message),
                            other => internal(other),
                        })
                    }
                }
            })
            .await
    }

    /// Get project information.
    #[tool(description = "Get the version, locale, default profile and request timeout")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "locale": self.config.locale,
            "profile": self.config.profile,
            "requestTimeoutMs": u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        });

        let text = if params.format == "json" {
            serde_json::to_string_pretty(&info)
                .map_err(|e| internal(format!("serialization error: {e}")))?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Score content with an assessor profile.
    #[tool(
        description = "Analyze content for SEO or readability. Takes the text (Markdown or HTML) plus optional title, description, url, keyword, synonyms, locale and profile. Returns per-assessment scores, feedback and an overall 0-100 score."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    async fn analyze_content(
        &self,
        Parameters(params): Parameters<AnalyzeContentParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "analyze_content", profile = ?params.profile, "executing MCP tool");

        if let Some(max) = self.max_input_bytes
            && params.paper.text.len() > max
        {
            return Err(McpError::invalid_params(
                format!(
                    "input too large: {} bytes (limit: {max} bytes)",
                    params.paper.text.len()
                ),
                None,
            ));
        }

        let analysis = self
            .worker()
            .await?
            .analyze(params.paper, params.profile)
            .await
            .map_err(internal)?;
        let report = analysis.report;

        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| internal(format!("serialization error: {e}")))?;

        tracing::info!(
            tool = "analyze_content",
            score = report.overall_score,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// List a profile's assessments.
    #[tool(description = "List the assessment identifiers a profile runs, with their score thresholds.")]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn list_assessments(
        &self,
        Parameters(params): Parameters<ListAssessmentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let profile = params.profile.unwrap_or(self.config.profile);
        tracing::debug!(tool = "list_assessments", %profile, "executing MCP tool");

        let pipeline = self.pipeline()?;
        let mut listed: Vec<serde_json::Value> = pipeline
            .assessor(profile)
            .map(|assessor| {
                assessor
                    .assessments()
                    .iter()
                    .map(|a| {
                        let thresholds: serde_json::Map<String, serde_json::Value> = a
                            .bands()
                            .map(|b| b.thresholds())
                            .unwrap_or_default()
                            .into_iter()
                            .map(|(name, value)| (name.to_string(), value.into()))
                            .collect();
                        serde_json::json!({
                            "identifier": a.identifier(),
                            "thresholds": thresholds,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        listed.extend(
            pipeline
                .pluggable()
                .assessments_for(profile)
                .iter()
                .map(|a| serde_json::json!({ "identifier": a.identifier(), "plugin": true })),
        );

        let json = serde_json::to_string_pretty(&serde_json::json!({
            "profile": profile,
            "assessments": listed,
        }))
        .map_err(|e| internal(format!("serialization error: {e}")))?;

        tracing::info!(tool = "list_assessments", count = listed.len(), "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use analyze_content to score text for SEO or readability.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}
