//! Assessments command: list a profile's assessments and thresholds.

use std::collections::BTreeMap;

use anyhow::Context;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use seoscope_core::config::Config;
use seoscope_core::{AssessmentRule, AssessorKind, Pipeline};

/// Arguments for the `assessments` subcommand.
#[derive(Args, Debug, Default)]
pub struct AssessmentsArgs {
    /// Profile to list (defaults to the configured profile).
    #[arg(short, long, value_enum)]
    pub profile: Option<AssessorKind>,
}

#[derive(Debug, Serialize, PartialEq)]
struct AssessmentInfo {
    identifier: String,
    source: &'static str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    thresholds: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Serialize)]
struct ProfileInfo {
    profile: AssessorKind,
    language: &'static str,
    assessments: Vec<AssessmentInfo>,
}

fn describe(config: &Config, profile: AssessorKind) -> anyhow::Result<ProfileInfo> {
    let pipeline =
        Pipeline::new(config.analysis.clone()).context("invalid analysis configuration")?;
    let mut assessments: Vec<AssessmentInfo> = pipeline
        .assessor(profile)
        .map(|assessor| {
            assessor
                .assessments()
                .iter()
                .map(|a| AssessmentInfo {
                    identifier: a.identifier().to_string(),
                    source: "built-in",
                    thresholds: a
                        .bands()
                        .map(|b| b.thresholds().into_iter().collect())
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    assessments.extend(
        pipeline
            .pluggable()
            .assessments_for(profile)
            .iter()
            .map(|a| AssessmentInfo {
                identifier: a.identifier().to_string(),
                source: "plugin",
                thresholds: BTreeMap::new(),
            }),
    );
    Ok(ProfileInfo {
        profile,
        language: pipeline.language().code,
        assessments,
    })
}

/// Print the assessments a profile runs, in run order.
#[instrument(name = "cmd_assessments", skip_all)]
pub fn cmd_assessments(
    args: AssessmentsArgs,
    global_json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let profile = args.profile.unwrap_or(config.analysis.profile);
    debug!(%profile, "executing assessments command");

    let info = describe(config, profile)?;
    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        info.profile.to_string().bold(),
        format!("({})", info.language).dimmed()
    );
    for assessment in &info.assessments {
        let thresholds: Vec<String> = assessment
            .thresholds
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if assessment.source == "plugin" {
            println!("  {} {}", assessment.identifier.cyan(), "(plugin)".dimmed());
        } else if thresholds.is_empty() {
            println!("  {}", assessment.identifier.cyan());
        } else {
            println!(
                "  {} {}",
                assessment.identifier.cyan(),
                thresholds.join(", ").dimmed()
            );
        }
    }
    Ok(())
}
