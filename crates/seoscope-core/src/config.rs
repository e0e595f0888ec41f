//! Configuration loading and discovery.
//!
//! Settings are layered with figment, lowest precedence first:
//!
//! 1. Built-in defaults (`#[serde(default)]` on every section)
//! 2. User config: `config.<ext>` in the platform config directory
//!    (`~/.config/seoscope/` on Linux)
//! 3. Project config: `.seoscope.<ext>` then `seoscope.<ext>`, taken from the
//!    closest directory at or above the search root that has any
//! 4. Files passed explicitly with [`ConfigLoader::with_file`]
//! 5. `SEOSCOPE_*` environment variables (`__` separates nested keys, so
//!    `SEOSCOPE_ANALYSIS__LOCALE=de_DE` sets `analysis.locale`)
//!
//! `<ext>` is one of `toml`, `yaml`, `yml` or `json`. When one directory holds
//! several formats they are all merged, later extensions winning.
//!
//! The `analysis` section doubles as the worker's `initialize` payload, so
//! its keys also accept the protocol's camelCase spelling
//! (`assessmentOverrides`, `customAssessments`, ...).
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use seoscope_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("analyzing as {}", config.analysis.locale);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assessor::AssessorKind;
use crate::error::{ConfigError, ConfigResult};

/// Input size limit applied when `max_input_bytes` is unset (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Worker request timeout applied when `request_timeout_ms` is unset.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Plugin name that configuration-defined assessments are registered under.
pub const CONFIGURATION_PLUGIN: &str = "configuration";

/// The configuration for seoscope.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application.
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Maximum input size in bytes (default: 5 MiB).
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    pub disable_input_limit: bool,
    /// How long a worker client waits for each response.
    pub request_timeout_ms: Option<u64>,
    /// Analysis settings, also sent to workers on `initialize`.
    pub analysis: AnalysisConfig,
}

impl Config {
    /// The effective input limit, or `None` when limits are disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// The effective worker request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(
            self.request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        )
    }
}

/// Settings consumed when a pipeline is built.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Content locale, e.g. `en_US`. Selects the language pack.
    pub locale: String,
    /// Fall back to the language-neutral pack for unsupported locales.
    #[serde(alias = "localeFallback")]
    pub locale_fallback: bool,
    /// Profile used when an analyze request does not name one.
    pub profile: AssessorKind,
    /// Base URL for the default call-to-action links.
    #[serde(alias = "linkBase")]
    pub link_base: String,
    /// Per-assessment link targets, replacing the defaults.
    #[serde(alias = "linkOverrides")]
    pub link_overrides: BTreeMap<String, LinkTargets>,
    /// Per-assessment threshold replacement: identifier → boundary → value.
    #[serde(alias = "assessmentOverrides")]
    pub assessment_overrides: BTreeMap<String, BTreeMap<String, f64>>,
    /// Pattern assessments registered through the extension registry.
    #[serde(alias = "customAssessments")]
    pub custom_assessments: Vec<CustomAssessmentConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            locale: "en_US".to_string(),
            locale_fallback: true,
            profile: AssessorKind::Seo,
            link_base: crate::assessment::DEFAULT_LINK_BASE.to_string(),
            link_overrides: BTreeMap::new(),
            assessment_overrides: BTreeMap::new(),
            custom_assessments: Vec::new(),
        }
    }
}

/// Link targets for one assessment's feedback.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
pub struct LinkTargets {
    /// Target of the link wrapped around the assessment title.
    pub title: String,
    /// Target of the call-to-action link.
    #[serde(alias = "callToAction")]
    pub call_to_action: String,
}

/// A declarative assessment that counts regex matches in the text.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, JsonSchema)]
pub struct CustomAssessmentConfig {
    /// Identifier reported in results.
    pub identifier: String,
    /// Assessor the rule joins.
    #[serde(default)]
    pub assessor: AssessorKind,
    /// Plugin that owns the rule.
    #[serde(default = "default_custom_plugin")]
    pub plugin: String,
    /// Regular expression matched against the prose.
    pub pattern: String,
    /// Highest number of matches that still scores good.
    #[serde(default, alias = "maxOccurrences")]
    pub max_occurrences: usize,
    /// Match case-insensitively.
    #[serde(default, alias = "caseInsensitive")]
    pub case_insensitive: bool,
    /// Title shown in feedback.
    pub title: String,
    /// Feedback when the rule passes.
    #[serde(default, alias = "goodFeedback")]
    pub good_feedback: Option<String>,
    /// Feedback when the rule fails.
    #[serde(default, alias = "badFeedback")]
    pub bad_feedback: Option<String>,
}

fn default_custom_plugin() -> String {
    CONFIGURATION_PLUGIN.to_string()
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which configuration files contributed to a loaded [`Config`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// User config file, if one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Project config files, low to high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// Files passed explicitly, low to high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// The highest-precedence file that was loaded.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .or_else(|| self.project_files.last())
            .map(Utf8PathBuf::as_path)
            .or(self.user_file.as_deref())
    }

    /// Every loaded file, low to high precedence.
    pub fn all_files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.user_file
            .iter()
            .chain(&self.project_files)
            .chain(&self.explicit_files)
            .map(Utf8PathBuf::as_path)
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

const APP_NAME: &str = "seoscope";

const ENV_PREFIX: &str = "SEOSCOPE_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug)]
pub struct ConfigLoader {
    search_root: Option<Utf8PathBuf>,
    user_config: bool,
    boundary_marker: Option<String>,
    files: Vec<Utf8PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader that reads user config and stops project search at `.git`.
    pub fn new() -> Self {
        Self {
            search_root: None,
            user_config: true,
            boundary_marker: Some(".git".to_string()),
            files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for project config.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip the user config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.user_config = include;
        self
    }

    /// Stop the upward search at a directory containing `marker`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Search all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Load an explicit file after everything discovered.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source and extract the configuration.
    #[tracing::instrument(skip(self), fields(search_root = ?self.search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        let sources = self.discover();
        tracing::debug!(files = sources.all_files().count(), "loading configuration");

        let figment = sources
            .all_files()
            // Defaults come from `#[serde(default)]`, so camelCase aliases in
            // files never collide with a serialized snake_case default.
            .fold(Figment::new(), merge_file)
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            locale = %config.analysis.locale,
            profile = %config.analysis.profile,
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Like [`load`](Self::load), but fail when no file was found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        if self.discover().all_files().next().is_none() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    fn discover(&self) -> ConfigSources {
        ConfigSources {
            user_file: self.user_config.then(find_user_config).flatten(),
            project_files: self
                .search_root
                .as_deref()
                .map(|root| self.find_project_configs(root))
                .unwrap_or_default(),
            explicit_files: self.files.clone(),
        }
    }

    /// Config files from the closest directory at or above `start` that has any.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        for dir in start.ancestors() {
            let found: Vec<Utf8PathBuf> = [format!(".{APP_NAME}"), APP_NAME.to_string()]
                .iter()
                .flat_map(|stem| {
                    CONFIG_EXTENSIONS
                        .iter()
                        .map(move |ext| dir.join(format!("{stem}.{ext}")))
                })
                .filter(|candidate| candidate.is_file())
                .collect();
            if !found.is_empty() {
                return found;
            }

            // Config next to the marker is still found; the search stops above it.
            if let Some(marker) = &self.boundary_marker
                && dir != start
                && dir.join(marker).exists()
            {
                break;
            }
        }
        Vec::new()
    }
}

fn find_user_config() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// The user config directory (`~/.config/seoscope/` on Linux).
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.config_dir().to_path_buf()).ok()
}

/// The user data directory (`~/.local/share/seoscope/` on Linux).
pub fn user_data_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(project_dirs()?.data_dir().to_path_buf()).ok()
}
