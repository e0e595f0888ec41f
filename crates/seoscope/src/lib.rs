//! Command-line front end for `seoscope-core`.
//!
//! The binary in `main.rs` parses a [`Cli`], loads configuration through
//! [`Cli::config_loader`] and hands the analysis settings to one of the
//! [`commands`]. The parser lives here so `xtask` can render man pages and
//! completions from [`command()`] and tests can parse argument lists.
//!
//! Commands that speak a protocol on stdout (the worker and the MCP server)
//! report it through [`Commands::owns_stdout`]; their logs stay off the
//! console unless asked for.

pub mod commands;

#[cfg(feature = "mcp")]
pub mod server;

use std::path::PathBuf;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{CommandFactory, Parser, Subcommand};
use seoscope_core::ConfigLoader;

/// Color output preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect terminal capabilities automatically.
    #[default]
    Auto,
    /// Always emit colors.
    Always,
    /// Never emit colors.
    Never,
}

impl ColorChoice {
    /// Set the process-wide color mode.
    pub fn apply(self) {
        match self {
            Self::Auto => {}
            Self::Always => owo_colors::set_override(true),
            Self::Never => owo_colors::set_override(false),
        }
    }
}

const ENV_HELP: &str = "\
ENVIRONMENT VARIABLES:
    RUST_LOG                    Log filter (e.g., debug, seoscope_core=trace)
    SEOSCOPE_LOG_PATH           Explicit log file path
    SEOSCOPE_LOG_DIR            Log directory
    SEOSCOPE_ANALYSIS__LOCALE   Content locale, e.g. de_DE
    SEOSCOPE_ANALYSIS__PROFILE  Default assessor profile
    SEOSCOPE_REQUEST_TIMEOUT_MS Worker response timeout
    SEOSCOPE_<KEY>              Any other config key, `__` for nesting
";

/// SEO and readability analysis for written content.
#[derive(Parser, Debug)]
#[command(name = "seoscope")]
#[command(about = "SEO and readability analysis for written content", long_about = None)]
#[command(version, arg_required_else_help = true)]
#[command(after_long_help = ENV_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print only the version number (for scripting)
    #[arg(long)]
    pub version_only: bool,

    /// Configuration file, merged over discovered ones
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long, global = true)]
    pub chdir: Option<PathBuf>,

    /// Only print errors (suppresses warnings/info)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More detail (repeatable; e.g. -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Colorize output
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,
}

impl Cli {
    /// A loader searching upward from `cwd`, plus the `--config` file.
    pub fn config_loader(&self, cwd: &Utf8Path) -> anyhow::Result<ConfigLoader> {
        let loader = ConfigLoader::new().with_project_search(cwd);
        let Some(path) = &self.config else {
            return Ok(loader);
        };
        let path = utf8(path.clone()).context("config path is not valid UTF-8")?;
        Ok(loader.with_file(&path))
    }
}

/// Convert a path, reporting the lossy form when it is not UTF-8.
pub fn utf8(path: PathBuf) -> anyhow::Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path)
        .map_err(|e| anyhow::anyhow!("{}", e.into_path_buf().display()))
}

/// Available subcommands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score files for SEO or readability
    Analyze(commands::analyze::AnalyzeArgs),

    /// List the assessments of a profile and their thresholds
    Assessments(commands::assessments::AssessmentsArgs),

    /// Run the JSON-lines worker protocol on stdin/stdout
    Worker(commands::worker::WorkerArgs),

    /// Show supported languages, profiles and the effective configuration
    Info(commands::info::InfoArgs),

    /// Start MCP (Model Context Protocol) server on stdio
    #[cfg(feature = "mcp")]
    Serve(commands::serve::ServeArgs),
}

impl Commands {
    /// Whether stdout carries a protocol rather than output for a person.
    pub const fn owns_stdout(&self) -> bool {
        match self {
            Self::Worker(_) => true,
            #[cfg(feature = "mcp")]
            Self::Serve(_) => true,
            _ => false,
        }
    }
}

/// Returns the clap command for documentation generation
pub fn command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("seoscope").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = parse(&["info", "--json", "-vv", "--color", "never"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert!(matches!(cli.command, Some(Commands::Info(_))));
    }

    #[test]
    fn protocol_commands_own_stdout() {
        assert!(parse(&["worker"]).command.unwrap().owns_stdout());
        assert!(!parse(&["info"]).command.unwrap().owns_stdout());
        assert!(!parse(&["assessments"]).command.unwrap().owns_stdout());
    }

    #[test]
    fn explicit_config_file_is_added_to_the_loader() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = utf8(dir.path().to_path_buf()).unwrap();
        let file = cwd.join("custom.toml");
        std::fs::write(&file, "[analysis]\nlocale = \"de_DE\"\n").unwrap();

        let cli = parse(&["--config", file.as_str(), "info"]);
        let (config, sources) = cli.config_loader(&cwd).unwrap().load().unwrap();
        assert_eq!(config.analysis.locale, "de_DE");
        assert_eq!(sources.primary_file(), Some(file.as_path()));
    }
}
