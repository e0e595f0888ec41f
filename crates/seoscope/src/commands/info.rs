//! Info command: what this build analyzes and the settings it would use.

use std::collections::BTreeMap;
use std::path::Path;

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use seoscope_core::config::{Config, ConfigSources};
use seoscope_core::language::{self, LanguagePack};
use seoscope_core::{AssessorKind, Pipeline};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct Info {
    name: &'static str,
    version: &'static str,
    config: Settings,
    analysis: Analysis,
    languages: Vec<Language>,
    profiles: Vec<Profile>,
}

/// Process-level settings and where they came from.
#[derive(Serialize)]
struct Settings {
    files: Vec<String>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_file: Option<String>,
    max_input_bytes: Option<usize>,
    request_timeout_ms: u64,
}

#[derive(Serialize)]
struct Analysis {
    locale: String,
    locale_fallback: bool,
    /// The pack the locale resolves to; absent when it resolves to none.
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<Language>,
    profile: AssessorKind,
    overrides: BTreeMap<String, BTreeMap<String, f64>>,
    custom_assessments: Vec<String>,
    /// Why a pipeline cannot be built from this configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Language {
    code: &'static str,
    name: &'static str,
    passive_voice: bool,
    transition_words: bool,
    reading_ease: bool,
}

impl From<&LanguagePack> for Language {
    fn from(pack: &LanguagePack) -> Self {
        Self {
            code: pack.code,
            name: pack.name,
            passive_voice: pack.detects_passive(),
            transition_words: pack.detects_transitions(),
            reading_ease: pack.flesch().is_some(),
        }
    }
}

#[derive(Serialize)]
struct Profile {
    profile: AssessorKind,
    default: bool,
    built_in: usize,
    plugin: usize,
}

impl Info {
    fn gather(config: &Config, sources: &ConfigSources, log_file: Option<&Path>) -> Self {
        let analysis = &config.analysis;
        let pipeline = Pipeline::new(analysis.clone());
        let language = match &pipeline {
            Ok(pipeline) => Some(Language::from(pipeline.language())),
            Err(_) => language::resolve(&analysis.locale, analysis.locale_fallback)
                .ok()
                .map(Language::from),
        };

        let profiles = AssessorKind::ALL
            .into_iter()
            .map(|kind| {
                let (built_in, plugin) = match &pipeline {
                    Ok(pipeline) => (
                        pipeline.assessor(kind).map_or(0, |a| a.assessments().len()),
                        pipeline.pluggable().assessments_for(kind).len(),
                    ),
                    Err(_) => (kind.assessments(&analysis.link_base).len(), 0),
                };
                Profile {
                    profile: kind,
                    default: kind == analysis.profile,
                    built_in,
                    plugin,
                }
            })
            .collect();

        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            config: Settings {
                files: sources.all_files().map(ToString::to_string).collect(),
                log_level: config.log_level.as_str(),
                log_file: log_file.map(|p| p.display().to_string()),
                max_input_bytes: config.input_limit(),
                request_timeout_ms: u64::try_from(config.request_timeout().as_millis())
                    .unwrap_or(u64::MAX),
            },
            analysis: Analysis {
                locale: analysis.locale.clone(),
                locale_fallback: analysis.locale_fallback,
                language,
                profile: analysis.profile,
                overrides: analysis.assessment_overrides.clone(),
                custom_assessments: analysis
                    .custom_assessments
                    .iter()
                    .map(|c| c.identifier.clone())
                    .collect(),
                error: pipeline.err().map(|e| e.to_string()),
            },
            languages: language::packs().into_iter().map(Language::from).collect(),
            profiles,
        }
    }
}

/// Print supported languages, profiles and the effective configuration.
///
/// An analysis configuration that cannot build a pipeline is reported, not
/// treated as a failure of this command.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
    log_file: Option<&Path>,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");
    let info = Info::gather(config, sources, log_file);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.name.bold(), info.version.green());

    heading("Configuration");
    if info.config.files.is_empty() {
        println!("{}: {}", "Files".dimmed(), "none loaded".yellow());
    } else {
        for file in &info.config.files {
            println!("{}: {}", "File".dimmed(), file.cyan());
        }
    }
    println!("{}: {}", "Log level".dimmed(), info.config.log_level);
    if let Some(ref file) = info.config.log_file {
        println!("{}: {}", "Log file".dimmed(), file);
    }
    match info.config.max_input_bytes {
        Some(max) => println!("{}: {max} bytes", "Input limit".dimmed()),
        None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
    }
    println!(
        "{}: {} ms",
        "Worker timeout".dimmed(),
        info.config.request_timeout_ms
    );

    heading("Analysis");
    let a = &info.analysis;
    let resolved = a
        .language
        .as_ref()
        .map_or_else(|| "unsupported".to_string(), |l| l.name.to_string());
    println!("{}: {} ({resolved})", "Locale".dimmed(), a.locale);
    println!("{}: {}", "Locale fallback".dimmed(), a.locale_fallback);
    println!("{}: {}", "Profile".dimmed(), a.profile);
    for (identifier, boundaries) in &a.overrides {
        let values: Vec<String> = boundaries.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("{}: {identifier} {}", "Override".dimmed(), values.join(" "));
    }
    if !a.custom_assessments.is_empty() {
        println!("{}: {}", "Custom".dimmed(), a.custom_assessments.join(", "));
    }
    if let Some(ref error) = a.error {
        println!("{}: {}", "Error".red(), error);
    }

    heading("Languages");
    for lang in &info.languages {
        let mut features = Vec::new();
        if lang.passive_voice {
            features.push("passive voice");
        }
        if lang.transition_words {
            features.push("transition words");
        }
        if lang.reading_ease {
            features.push("reading ease");
        }
        println!("  {:<4}{:<10}{}", lang.code, lang.name, features.join(", ").dimmed());
    }

    heading("Profiles");
    for p in &info.profiles {
        let marker = if p.default { " (default)" } else { "" };
        print!("  {:<25}{:>2} built-in", p.profile.as_str(), p.built_in);
        if p.plugin > 0 {
            print!(", {} plugin", p.plugin);
        }
        println!("{}", marker.green());
    }

    Ok(())
}

fn heading(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

#[cfg(test)]
mod tests {
    use super::*;
    use seoscope_core::config::CustomAssessmentConfig;

    fn custom(identifier: &str, pattern: &str) -> CustomAssessmentConfig {
        serde_json::from_value(serde_json::json!({
            "identifier": identifier,
            "title": "Placeholder text",
            "pattern": pattern,
        }))
        .unwrap()
    }

    #[test]
    fn text_and_json_output_succeed() {
        let config = Config::default();
        let sources = ConfigSources::default();
        assert!(cmd_info(InfoArgs::default(), false, &config, &sources, None).is_ok());
        assert!(cmd_info(InfoArgs::default(), true, &config, &sources, None).is_ok());
    }

    #[test]
    fn defaults_report_english_and_every_profile() {
        let info = Info::gather(&Config::default(), &ConfigSources::default(), None);
        assert!(info.config.files.is_empty());
        assert_eq!(info.config.log_level, "info");
        assert_eq!(info.config.max_input_bytes, Some(5 * 1024 * 1024));
        assert_eq!(info.config.request_timeout_ms, 30_000);

        let language = info.analysis.language.as_ref().unwrap();
        assert_eq!(language.code, "en");
        assert!(info.analysis.error.is_none());

        let codes: Vec<_> = info.languages.iter().map(|l| l.code).collect();
        assert_eq!(codes, ["en", "de"]);
        assert!(info.languages.iter().all(|l| l.reading_ease));

        assert_eq!(info.profiles.len(), AssessorKind::ALL.len());
        let seo = &info.profiles[0];
        assert_eq!(seo.profile, AssessorKind::Seo);
        assert!(seo.default);
        assert!(seo.built_in > 0);
        assert_eq!(seo.plugin, 0);
        let readability = info
            .profiles
            .iter()
            .find(|p| p.profile == AssessorKind::Readability)
            .unwrap();
        assert_eq!(readability.built_in, 8);
    }

    #[test]
    fn custom_assessments_count_as_plugins() {
        let mut config = Config::default();
        config
            .analysis
            .custom_assessments
            .push(custom("noLoremIpsum", "lorem ipsum"));
        let info = Info::gather(&config, &ConfigSources::default(), None);
        assert_eq!(info.analysis.custom_assessments, ["noLoremIpsum"]);
        assert!(info.profiles.iter().any(|p| p.plugin == 1));
    }

    #[test]
    fn unbuildable_configuration_is_reported() {
        let mut config = Config::default();
        config.disable_input_limit = true;
        config.analysis.locale = "fr_FR".into();
        config.analysis.locale_fallback = false;
        let info = Info::gather(&config, &ConfigSources::default(), None);

        assert!(info.config.max_input_bytes.is_none());
        assert!(info.analysis.language.is_none());
        assert!(info.analysis.error.as_deref().is_some_and(|e| e.contains("fr")));
        assert!(info.profiles.iter().all(|p| p.built_in > 0 && p.plugin == 0));
    }

    #[test]
    fn fallback_resolves_to_the_neutral_pack() {
        let mut config = Config::default();
        config.analysis.locale = "fr_FR".into();
        let info = Info::gather(&config, &ConfigSources::default(), None);
        let language = info.analysis.language.as_ref().unwrap();
        assert_eq!(language.name, "language-neutral");
        assert!(!language.passive_voice);
    }

    #[test]
    fn log_file_is_reported() {
        let info = Info::gather(
            &Config::default(),
            &ConfigSources::default(),
            Some(Path::new("/tmp/logs/seoscope.jsonl")),
        );
        assert_eq!(info.config.log_file.as_deref(), Some("/tmp/logs/seoscope.jsonl"));
    }
}
