//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn short_help_flag_shows_usage() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn short_version_flag_shows_version() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_only_prints_bare_version() {
    cmd()
        .arg("--version-only")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "{}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_json_outputs_valid_json() {
    let output = cmd().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn info_json_contains_expected_fields() {
    cmd()
        .arg("info")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\""))
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn info_help_shows_command_options() {
    cmd()
        .args(["info", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "info"]).assert().success();
}

#[test]
fn short_quiet_flag_accepted() {
    cmd().args(["-q", "info"]).assert().success();
}

#[test]
fn verbose_flag_accepted() {
    cmd().args(["--verbose", "info"]).assert().success();
}

#[test]
fn short_verbose_flag_accepted() {
    cmd().args(["-v", "info"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "info"]).assert().success();
}

#[test]
fn color_auto_accepted() {
    cmd().args(["--color", "auto", "info"]).assert().success();
}

#[test]
fn color_always_accepted() {
    cmd().args(["--color", "always", "info"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "info"]).assert().success();
}

// =============================================================================
// Analyze Command
// =============================================================================

const POST: &str = "\
# Growing tomatoes

Tomatoes need sun, water and patience. Growing tomatoes on a balcony works well.
Pick a sunny spot and a deep pot.

## Watering

Water in the morning. Keep the soil moist but not wet.
";

fn post_file() -> tempfile::NamedTempFile {
    let tmp = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    std::fs::write(tmp.path(), POST).unwrap();
    tmp
}

#[test]
fn analyze_prints_scores() {
    let tmp = post_file();
    cmd()
        .args(["--color", "never", "analyze", tmp.path().to_str().unwrap()])
        .args(["--keyword", "growing tomatoes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/100"))
        .stdout(predicate::str::contains("Keyphrase length"));
}

#[test]
fn analyze_json_has_report_fields() {
    let tmp = post_file();
    let output = cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--json"])
        .args(["--keyword", "tomatoes", "--profile", "readability"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["profile"], "readability");
    assert!(json["overallScore"].as_u64().is_some());
    assert!(json["results"].as_array().is_some_and(|r| !r.is_empty()));
}

#[test]
fn analyze_multiple_files_outputs_array() {
    let first = post_file();
    let second = post_file();
    let output = cmd()
        .args(["analyze", "--json"])
        .arg(first.path())
        .arg(second.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}

#[test]
fn analyze_min_score_gate_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "Tiny.").unwrap();
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--min-score", "90"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("below minimum"));
}

#[test]
fn analyze_unknown_profile_fails() {
    let tmp = post_file();
    cmd()
        .args(["analyze", tmp.path().to_str().unwrap(), "--profile", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn analyze_missing_file_fails() {
    cmd()
        .args(["analyze", "does-not-exist.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn analyze_requires_a_file() {
    cmd().arg("analyze").assert().failure();
}

// =============================================================================
// Assessments Command
// =============================================================================

#[test]
fn assessments_lists_profile() {
    cmd()
        .args(["--color", "never", "assessments", "--profile", "seo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keyphraseLength"))
        .stdout(predicate::str::contains("textLength"));
}

#[test]
fn assessments_json_lists_readability() {
    let output = cmd()
        .args(["assessments", "--profile", "readability", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["profile"], "readability");
    assert_eq!(json["assessments"].as_array().map(Vec::len), Some(8));
}

// =============================================================================
// Worker Command
// =============================================================================

fn worker_responses(input: &str, extra: &[&str]) -> Vec<serde_json::Value> {
    let output = cmd()
        .arg("worker")
        .args(extra)
        .write_stdin(input)
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect()
}

#[test]
fn worker_answers_initialize_and_analyze() {
    let input = concat!(
        r#"{"id":1,"type":"initialize","payload":{"locale":"en_US"}}"#,
        "\n",
        r#"{"id":2,"type":"analyze","payload":{"text":"Hello world. This is a test.","keyword":"test"}}"#,
        "\n",
    );
    let responses = worker_responses(input, &[]);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["type"], "result");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["type"], "result");
    assert!(responses[1]["payload"]["overallScore"].is_u64());
}

#[test]
fn worker_rejects_analyze_before_initialize() {
    let input = concat!(
        r#"{"id":7,"type":"analyze","payload":{"text":"Hi."}}"#,
        "\n"
    );
    let responses = worker_responses(input, &[]);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 7);
    assert_eq!(responses[0]["type"], "error");
}

#[test]
fn worker_reports_malformed_lines() {
    let responses = worker_responses("{not json\n", &[]);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 0);
    assert_eq!(responses[0]["type"], "error");
}

#[test]
fn worker_preload_initializes_from_config() {
    let input = concat!(
        r#"{"id":1,"type":"analyze","payload":{"text":"Hello world."}}"#,
        "\n"
    );
    let responses = worker_responses(input, &["--preload"]);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 0);
    assert_eq!(responses[0]["payload"]["language"], "en");
    assert_eq!(responses[1]["type"], "result");
}

#[test]
fn worker_terminate_fails_later_requests() {
    let input = concat!(
        r#"{"id":1,"type":"initialize","payload":{}}"#,
        "\n",
        r#"{"id":2,"type":"terminate"}"#,
        "\n",
        r#"{"id":3,"type":"analyze","payload":{"text":"Late."}}"#,
        "\n",
    );
    let responses = worker_responses(input, &[]);
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[1]["type"], "result");
    assert_eq!(responses[2]["type"], "error");
    assert_eq!(responses[2]["payload"]["kind"], "terminated");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    // arg_required_else_help makes clap print help to stderr and exit 2
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_flag_shows_error() {
    cmd()
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn oversized_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("seoscope.toml");
    std::fs::write(&config, "max_input_bytes = 16\n").unwrap();
    let file = dir.path().join("post.md");
    std::fs::write(&file, POST).unwrap();
    cmd()
        .args(["--config", config.to_str().unwrap(), "analyze"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input too large"));
}
