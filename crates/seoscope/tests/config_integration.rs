//! Configuration integration tests.
//!
//! Each test writes configuration into a temporary project and checks what
//! the binary does with it: `info --json` for the resolved settings,
//! `assessments --json` for effective thresholds, and `analyze` or `worker`
//! for the analysis itself.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// A Command running from `dir`.
fn cmd_in(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.args(["-C", dir.to_str().unwrap()]);
    cmd
}

/// Run a command expected to succeed and parse its stdout as JSON.
fn json_of(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

fn info_json(dir: &Path) -> Value {
    json_of(cmd_in(dir).args(["info", "--json"]))
}

fn project(file: &str, contents: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(file), contents).unwrap();
    tmp
}

/// The `textLength` thresholds a profile lists.
fn text_length_thresholds(dir: &Path, profile: &str) -> Value {
    let json = json_of(cmd_in(dir).args(["assessments", "--json", "--profile", profile]));
    json["assessments"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["identifier"] == "textLength")
        .expect("textLength listed")["thresholds"]
        .clone()
}

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn defaults_without_any_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert!(json["config"]["files"].as_array().unwrap().is_empty());
    assert_eq!(json["analysis"]["locale"], "en_US");
    assert_eq!(json["analysis"]["language"]["code"], "en");
    assert_eq!(json["analysis"]["profile"], "seo");
    assert_eq!(json["config"]["request_timeout_ms"], 30_000);
    assert!(json["analysis"]["error"].is_null());
}

#[test]
fn project_profile_reaches_analyze() {
    let tmp = project(".seoscope.toml", "[analysis]\nprofile = \"readability\"\n");
    fs::write(tmp.path().join("post.md"), "Short posts are easy to read.\n").unwrap();

    let json = json_of(cmd_in(tmp.path()).args(["analyze", "post.md", "--json"]));
    assert_eq!(json["profile"], "readability");
    assert_eq!(json["file"], "post.md");
}

#[test]
fn closer_config_wins_on_locale() {
    let tmp = project(".seoscope.toml", "[analysis]\nlocale = \"en_GB\"\n");
    let child = tmp.path().join("docs");
    fs::create_dir(&child).unwrap();
    fs::write(child.join(".seoscope.yaml"), "analysis:\n  locale: de_AT\n").unwrap();

    let json = info_json(&child);
    assert_eq!(json["analysis"]["locale"], "de_AT");
    assert_eq!(json["analysis"]["language"]["name"], "German");
    assert_eq!(json["config"]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn git_boundary_stops_config_search() {
    let tmp = project(".seoscope.toml", "[analysis]\nprofile = \"readability\"\n");
    let repo = tmp.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();

    let json = info_json(&repo);
    assert_eq!(json["analysis"]["profile"], "seo");
    assert!(json["config"]["files"].as_array().unwrap().is_empty());
}

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = project(".seoscope.toml", "[analysis]\nprofile = \"readability\"\n");
    let explicit = tmp.path().join("ci.json");
    fs::write(&explicit, r#"{"analysis": {"profile": "taxonomy-seo"}}"#).unwrap();

    let json = json_of(
        cmd_in(tmp.path())
            .args(["--config", explicit.to_str().unwrap()])
            .args(["info", "--json"]),
    );
    assert_eq!(json["analysis"]["profile"], "taxonomy-seo");
    let files = json["config"]["files"].as_array().unwrap();
    assert!(files.last().unwrap().as_str().unwrap().ends_with("ci.json"));
}

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = project(".seoscope.toml", "[analysis\nlocale = ");
    cmd_in(tmp.path())
        .args(["info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

// =============================================================================
// Locale
// =============================================================================

#[test]
fn german_locale_selects_german_pack() {
    let tmp = project(".seoscope.toml", "[analysis]\nlocale = \"de_DE\"\n");
    let json = info_json(tmp.path());
    assert_eq!(json["analysis"]["language"]["code"], "de");
    assert_eq!(json["analysis"]["language"]["passive_voice"], true);
}

#[test]
fn unsupported_locale_without_fallback_fails_analysis() {
    let tmp = project(
        ".seoscope.toml",
        "[analysis]\nlocale = \"fr_FR\"\nlocale_fallback = false\n",
    );
    fs::write(tmp.path().join("post.md"), "Bonjour.\n").unwrap();

    cmd_in(tmp.path())
        .args(["analyze", "post.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fr_FR"));

    // info still answers and says why.
    let json = info_json(tmp.path());
    assert!(json["analysis"]["language"].is_null());
    assert!(json["analysis"]["error"].as_str().unwrap().contains("fr_FR"));
}

#[test]
fn unsupported_locale_falls_back_to_neutral_pack() {
    let tmp = project(".seoscope.toml", "[analysis]\nlocale = \"fr_FR\"\n");
    let json = info_json(tmp.path());
    assert_eq!(json["analysis"]["language"]["name"], "language-neutral");
    assert_eq!(json["analysis"]["language"]["reading_ease"], false);
}

#[test]
fn malformed_locale_is_rejected() {
    let tmp = project(".seoscope.toml", "[analysis]\nlocale = \"english please\"\n");
    let json = info_json(tmp.path());
    assert!(json["analysis"]["error"].as_str().is_some());
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn env_vars_override_analysis_keys() {
    let tmp = project(
        ".seoscope.toml",
        "[analysis]\nlocale = \"de_DE\"\nprofile = \"readability\"\n",
    );

    let json = json_of(
        cmd_in(tmp.path())
            .env("SEOSCOPE_ANALYSIS__LOCALE", "en_GB")
            .env("SEOSCOPE_ANALYSIS__PROFILE", "cornerstone-seo")
            .args(["info", "--json"]),
    );
    assert_eq!(json["analysis"]["locale"], "en_GB");
    assert_eq!(json["analysis"]["language"]["code"], "en");
    assert_eq!(json["analysis"]["profile"], "cornerstone-seo");
    let default: Vec<_> = json["profiles"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["default"] == true)
        .map(|p| p["profile"].clone())
        .collect();
    assert_eq!(default, ["cornerstone-seo"]);
}

#[test]
fn env_profile_reaches_assessments() {
    let tmp = TempDir::new().unwrap();
    let json = json_of(
        cmd_in(tmp.path())
            .env("SEOSCOPE_ANALYSIS__PROFILE", "readability")
            .args(["assessments", "--json"]),
    );
    assert_eq!(json["profile"], "readability");
}

// =============================================================================
// Worker timeout and limits
// =============================================================================

#[test]
fn request_timeout_from_file() {
    let tmp = project(".seoscope.toml", "request_timeout_ms = 1500\n");
    let json = info_json(tmp.path());
    assert_eq!(json["config"]["request_timeout_ms"], 1500);
}

#[test]
fn request_timeout_from_env_beats_file() {
    let tmp = project(".seoscope.toml", "request_timeout_ms = 1500\n");
    let json = json_of(
        cmd_in(tmp.path())
            .env("SEOSCOPE_REQUEST_TIMEOUT_MS", "250")
            .args(["info", "--json"]),
    );
    assert_eq!(json["config"]["request_timeout_ms"], 250);
}

#[test]
fn max_input_bytes_rejects_large_files() {
    let tmp = project(".seoscope.toml", "max_input_bytes = 16\n");
    fs::write(tmp.path().join("post.md"), "x".repeat(64)).unwrap();

    cmd_in(tmp.path())
        .args(["analyze", "post.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}

#[test]
fn preloaded_worker_uses_configured_locale() {
    let tmp = project(".seoscope.toml", "[analysis]\nlocale = \"de_DE\"\n");
    let output = cmd_in(tmp.path())
        .args(["worker", "--preload"])
        .write_stdin("")
        .output()
        .expect("failed to run worker");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["id"], 0);
    assert_eq!(first["type"], "result");
    assert_eq!(first["payload"]["language"], "de");
}

// =============================================================================
// Assessment overrides
// =============================================================================

#[test]
fn camel_case_keys_are_accepted() {
    let tmp = project(
        ".seoscope.json",
        r#"{"analysis": {
            "localeFallback": false,
            "assessmentOverrides": {"textLength": {"recommendedMinimum": 500}}
        }}"#,
    );

    let json = info_json(tmp.path());
    assert_eq!(json["analysis"]["locale_fallback"], false);
    assert_eq!(json["analysis"]["overrides"]["textLength"]["recommendedMinimum"], 500.0);
    assert_eq!(text_length_thresholds(tmp.path(), "seo")["recommendedMinimum"], 500.0);
}

#[test]
fn override_applies_only_where_it_fits() {
    let tmp = project(
        ".seoscope.yaml",
        "analysis:\n  assessment_overrides:\n    textLength:\n      recommendedMinimum: 350\n",
    );

    assert_eq!(text_length_thresholds(tmp.path(), "seo")["recommendedMinimum"], 350.0);
    assert_eq!(
        text_length_thresholds(tmp.path(), "taxonomy-seo")["recommendedMinimum"],
        350.0
    );
    // Cornerstone already requires 400 below the minimum, so it keeps 900.
    assert_eq!(
        text_length_thresholds(tmp.path(), "cornerstone-seo")["recommendedMinimum"],
        900.0
    );

    fs::write(tmp.path().join("post.md"), "A short post.\n").unwrap();
    cmd_in(tmp.path())
        .args(["analyze", "post.md", "--profile", "cornerstone-seo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("does not fit"));
}

#[test]
fn override_that_fits_no_profile_fails() {
    let tmp = project(
        ".seoscope.toml",
        "[analysis.assessment_overrides.textLength]\nslightlyBelowMinimum = 10\n",
    );
    fs::write(tmp.path().join("post.md"), "Some text.\n").unwrap();

    cmd_in(tmp.path())
        .args(["analyze", "post.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("textLength"));
}

#[test]
fn unknown_override_target_fails_analysis() {
    let tmp = project(
        ".seoscope.yaml",
        "analysis:\n  assessment_overrides:\n    noSuchAssessment:\n      minimum: 1\n",
    );
    fs::write(tmp.path().join("post.md"), "Some text.\n").unwrap();

    cmd_in(tmp.path())
        .args(["analyze", "post.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("noSuchAssessment"));
}

// =============================================================================
// Custom assessments
// =============================================================================

const LOREM_RULE: &str = "\
analysis:
  custom_assessments:
    - identifier: noLoremIpsum
      assessor: seo
      pattern: lorem ipsum
      case_insensitive: true
      title: Placeholder text
";

#[test]
fn custom_assessment_scores_analyzed_text() {
    let tmp = project(".seoscope.yaml", LOREM_RULE);
    fs::write(tmp.path().join("post.md"), "Lorem ipsum dolor sit amet.\n").unwrap();

    let json = json_of(cmd_in(tmp.path()).args(["analyze", "post.md", "--json"]));
    let rule = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["identifier"] == "noLoremIpsum")
        .expect("custom result reported");
    assert_eq!(rule["rating"], "bad");
    assert!(rule["feedbackText"].as_str().unwrap().starts_with("Placeholder text"));
}

#[test]
fn custom_assessment_is_counted_per_profile() {
    let tmp = project(".seoscope.yaml", LOREM_RULE);

    let json = info_json(tmp.path());
    assert_eq!(json["analysis"]["custom_assessments"][0], "noLoremIpsum");
    for profile in json["profiles"].as_array().unwrap() {
        let expected = u64::from(profile["profile"] == "seo");
        assert_eq!(profile["plugin"], expected, "{}", profile["profile"]);
    }

    cmd_in(tmp.path())
        .args(["assessments"])
        .assert()
        .success()
        .stdout(predicate::str::contains("noLoremIpsum"));
}

#[test]
fn invalid_custom_pattern_fails() {
    let tmp = project(
        ".seoscope.yaml",
        "\
analysis:
  custom_assessments:
    - identifier: broken
      pattern: \"(unclosed\"
      title: Broken rule
",
    );

    cmd_in(tmp.path())
        .args(["assessments"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
}
