//! Logging setup: human-readable events on stderr, JSONL events in a file.
//!
//! The log file location is, in order: `SEOSCOPE_LOG_PATH`, a
//! `seoscope.jsonl` inside `SEOSCOPE_LOG_DIR`, the configured `log_dir`, then
//! the platform data directory. When no location is writable only stderr
//! logging is set up.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PATH_ENV: &str = "SEOSCOPE_LOG_PATH";
const LOG_DIR_ENV: &str = "SEOSCOPE_LOG_DIR";
const LOG_FILE_NAME: &str = "seoscope.jsonl";

/// Where JSONL logs go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Explicit log file.
    pub log_path: Option<PathBuf>,
    /// Directory for the default log file name.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Read the environment, using `config_dir` when neither variable is set.
    pub fn from_env_with_overrides(config_dir: Option<PathBuf>) -> Self {
        let log_path = std::env::var_os(LOG_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let log_dir = std::env::var_os(LOG_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or(config_dir)
            .or_else(|| {
                seoscope_core::config::user_data_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });
        Self { log_path, log_dir }
    }

    /// Full path of the JSONL log file, if one is configured.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file().map(|(dir, name)| dir.join(name))
    }

    /// The log file as (directory, file name).
    fn log_file(&self) -> Option<(PathBuf, PathBuf)> {
        if let Some(path) = &self.log_path {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            let name = PathBuf::from(path.file_name()?);
            return Some((dir, name));
        }
        let dir = self.log_dir.clone()?;
        Some((dir, PathBuf::from(LOG_FILE_NAME)))
    }
}

/// Keeps the background log writer alive; flushes on drop.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Build the event filter.
///
/// `-q` and `-v` win over `RUST_LOG`, which wins over the configured level.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    let forced = if quiet {
        Some("error")
    } else {
        match verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    };
    if let Some(level) = forced {
        return EnvFilter::new(level);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let mut file_error = None;
    let (file_layer, guard) = match config.log_file() {
        Some((dir, name)) => match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::never(&dir, &name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().json().with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(error) => {
                file_error = Some((dir, error));
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    if let Some((dir, error)) = file_error {
        tracing::warn!(dir = %dir.display(), %error, "file logging disabled");
    }
    Ok(ObservabilityGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configured_level() {
        assert_eq!(env_filter(true, 0, "info").to_string(), "error");
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 3, "info").to_string(), "trace");
    }

    #[test]
    fn explicit_path_splits_into_dir_and_name() {
        let config = ObservabilityConfig {
            log_path: Some(PathBuf::from("/tmp/logs/run.jsonl")),
            log_dir: Some(PathBuf::from("/ignored")),
        };
        assert_eq!(
            config.log_file(),
            Some((PathBuf::from("/tmp/logs"), PathBuf::from("run.jsonl")))
        );
    }

    #[test]
    fn bare_file_name_logs_to_current_dir() {
        let config = ObservabilityConfig {
            log_path: Some(PathBuf::from("run.jsonl")),
            log_dir: None,
        };
        assert_eq!(
            config.log_file(),
            Some((PathBuf::from("."), PathBuf::from("run.jsonl")))
        );
    }

    #[test]
    fn directory_uses_default_name() {
        let config = ObservabilityConfig {
            log_path: None,
            log_dir: Some(PathBuf::from("/var/log/seoscope")),
        };
        assert_eq!(
            config.log_file(),
            Some((
                PathBuf::from("/var/log/seoscope"),
                PathBuf::from(LOG_FILE_NAME)
            ))
        );
        assert_eq!(ObservabilityConfig::default().log_file(), None);
        assert_eq!(
            config.log_file_path(),
            Some(PathBuf::from("/var/log/seoscope").join(LOG_FILE_NAME))
        );
    }
}
