//! Analyze command: score files with an assessor profile.

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use seoscope_core::config::Config;
use seoscope_core::{AnalysisReport, AssessorKind, Paper, PaperInput, Pipeline, Rating};

use super::{plain_feedback, read_input_file};

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Files to analyze (CommonMark, HTML allowed).
    #[arg(required = true)]
    pub files: Vec<Utf8PathBuf>,

    /// Focus keyphrase. Quote it ("...") for an exact match.
    #[arg(short, long, default_value = "")]
    pub keyword: String,

    /// Comma-separated keyphrase synonyms.
    #[arg(long, default_value = "")]
    pub synonyms: String,

    /// SEO title.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Meta description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// URL or slug of the page.
    #[arg(long, default_value = "")]
    pub url: String,

    /// Canonical URL; links to the same host count as internal.
    #[arg(long, default_value = "")]
    pub permalink: String,

    /// Content locale (overrides the configured one for this run).
    #[arg(long, default_value = "")]
    pub locale: String,

    /// Rendered SEO title width in pixels.
    #[arg(long)]
    pub title_width: Option<f64>,

    /// Assessor profile (defaults to the configured profile).
    #[arg(short, long, value_enum)]
    pub profile: Option<AssessorKind>,

    /// Fail when any file's overall score (0–100) is below this.
    #[arg(long)]
    pub min_score: Option<u8>,
}

impl AnalyzeArgs {
    fn paper(&self, text: String) -> Paper {
        Paper::new(PaperInput {
            text,
            title: self.title.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            keyword: self.keyword.clone(),
            synonyms: self.synonyms.clone(),
            locale: self.locale.clone(),
            permalink: self.permalink.clone(),
            title_width: self.title_width,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    file: Utf8PathBuf,
    #[serde(flatten)]
    report: AnalysisReport,
}

/// Analyze each file and print its report.
#[instrument(name = "cmd_analyze", skip_all, fields(files = args.files.len()))]
pub fn cmd_analyze(
    args: AnalyzeArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(files = ?args.files, profile = ?args.profile, "executing analyze command");

    let mut pipeline =
        Pipeline::new(config.analysis.clone()).context("invalid analysis configuration")?;
    let profile = args.profile.unwrap_or(config.analysis.profile);

    let progress = (!global_json && args.files.len() > 1).then(|| {
        let bar = ProgressBar::new(args.files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    });

    let mut reports = Vec::with_capacity(args.files.len());
    for file in &args.files {
        if let Some(bar) = &progress {
            bar.set_message(file.to_string());
        }
        let text = read_input_file(file, max_input_bytes)?;
        let paper = args.paper(text);
        let report = pipeline
            .run(&paper, profile, &seoscope_core::CancellationFlag::new())
            .with_context(|| format!("analysis of {file} was cancelled"))?;
        reports.push(FileReport {
            file: file.clone(),
            report,
        });
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if global_json {
        if let [single] = reports.as_slice() {
            println!("{}", serde_json::to_string_pretty(single)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    } else {
        for file_report in &reports {
            print_report(file_report);
        }
    }

    if let Some(min) = args.min_score {
        let failing: Vec<_> = reports
            .iter()
            .filter(|r| r.report.overall_score < min)
            .map(|r| format!("{} ({})", r.file, r.report.overall_score))
            .collect();
        if !failing.is_empty() {
            bail!(
                "overall score below minimum {min}: {}. Address the red and orange results first.",
                failing.join(", ")
            );
        }
    }

    Ok(())
}

fn print_report(file_report: &FileReport) {
    let FileReport { file, report } = file_report;
    println!(
        "{} {} {}/100 ({})",
        file.bold(),
        report.profile.dimmed(),
        paint(report.rating, &report.overall_score.to_string()),
        report.rating,
    );
    for result in &report.results {
        println!(
            "  {} {}",
            paint(result.rating, bullet(result.rating)),
            plain_feedback(&result.feedback_text),
        );
        for mark in &result.marks {
            println!("      {} {}", "›".dimmed(), mark.original.dimmed());
        }
    }
    println!();
}

const fn bullet(rating: Rating) -> &'static str {
    match rating {
        Rating::Good => "●",
        Rating::Ok => "◐",
        Rating::Bad => "○",
        Rating::Feedback => "·",
    }
}

fn paint(rating: Rating, text: &str) -> String {
    match rating {
        Rating::Good => text.green().to_string(),
        Rating::Ok => text.yellow().to_string(),
        Rating::Bad => text.red().to_string(),
        Rating::Feedback => text.dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn analyzes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "post.md", "# Gardens\n\nGardens are lovely in spring.\n");
        let args = AnalyzeArgs {
            files: vec![file],
            keyword: "gardens".into(),
            ..Default::default()
        };
        assert!(cmd_analyze(args, true, &Config::default(), None).is_ok());
    }

    #[test]
    fn min_score_gate_fails_low_scores() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(&dir, "short.md", "Too short.\n");
        let args = AnalyzeArgs {
            files: vec![file],
            min_score: Some(95),
            ..Default::default()
        };
        let err = cmd_analyze(args, false, &Config::default(), None).unwrap_err();
        assert!(err.to_string().contains("below minimum 95"));
    }

    #[test]
    fn paper_carries_flags() {
        let args = AnalyzeArgs {
            keyword: "\"exact phrase\"".into(),
            locale: "de_DE".into(),
            title_width: Some(410.0),
            ..Default::default()
        };
        let paper = args.paper("Text.".into());
        assert_eq!(paper.locale(), "de_DE");
        assert!(paper.has_keyword());
        assert_eq!(paper.text(), "Text.");
    }
}
