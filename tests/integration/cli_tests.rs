//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/specs")
}

fn fixture(name: &str) -> String {
    fixtures_path().join(name).to_string_lossy().to_string()
}

fn specscope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_specscope"))
}

/// Run specscope with arguments and return (stdout, stderr, success)
fn run_cli(args: &[&str]) -> (String, String, bool) {
    let output = specscope()
        .args(args)
        .output()
        .expect("Failed to execute command");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, success) = run_cli(args);
    assert!(success, "specscope failed: {}", stderr);
    serde_json::from_str(&stdout).expect("stdout should be a single JSON document")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    specscope()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("specscope"))
        .stdout(predicate::str::contains("--matrix"))
        .stdout(predicate::str::contains("--fail-on-findings"));
}

#[test]
fn test_cli_version() {
    specscope()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("specscope"));
}

#[test]
fn test_cli_invalid_severity() {
    specscope()
        .args([fixture("shop.yaml").as_str(), "--min-severity", "fatal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown severity"));
}

#[test]
fn test_cli_missing_explicit_file() {
    specscope()
        .arg(fixture("missing.yaml"))
        .assert()
        .failure();
}

// ============================================================================
// Output Format Tests
// ============================================================================

#[test]
fn test_cli_json_output() {
    let value = run_json(&[&fixture("shop.yaml"), "--format", "json", "--quiet"]);

    assert_eq!(value["version"], "1.0");
    assert_eq!(value["total_issues"], 7);
    assert_eq!(value["summary"]["errors"], 1);
    assert_eq!(value["summary"]["warnings"], 1);
    assert_eq!(value["summary"]["operations"], 5);

    let spec = &value["specs"][0];
    assert_eq!(spec["stats"]["title"], "Shop");
    assert_eq!(spec["vulnerabilities"][0]["endpoint"], "GET /debug/session");
    assert_eq!(spec["authz"]["operations"]["GET /health"][0], "PUBLIC");
}

#[test]
fn test_cli_min_severity() {
    let value = run_json(&[
        &fixture("shop.yaml"),
        "--format",
        "json",
        "--min-severity",
        "error",
        "--quiet",
    ]);

    assert_eq!(value["total_issues"], 1);
    assert_eq!(value["specs"][0]["findings"][0]["kind"]["type"], "sensitive_data_exposure");
}

#[test]
fn test_cli_sarif_output_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results.sarif");

    specscope()
        .args([
            fixture("shop.yaml").as_str(),
            "--format",
            "sarif",
            "--output",
            output.to_str().unwrap(),
            "--quiet",
        ])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();

    assert_eq!(value["version"], "2.1.0");
    assert_eq!(value["runs"][0]["results"].as_array().unwrap().len(), 7);
}

#[test]
fn test_cli_terminal_matrix() {
    specscope()
        .args([fixture("shop.yaml").as_str(), "--matrix", "--depths"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Authorization matrix"))
        .stdout(predicate::str::contains("PUBLIC"))
        .stdout(predicate::str::contains("Nesting depth"));
}

#[test]
fn test_cli_max_depth_override() {
    let value = run_json(&[
        &fixture("shop.yaml"),
        "--format",
        "json",
        "--max-depth",
        "1",
        "--quiet",
    ]);

    let nesting: Vec<&str> = value["specs"][0]["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["kind"]["type"] == "excessive_nesting")
        .filter_map(|f| f["kind"]["endpoint"].as_str())
        .collect();
    assert_eq!(nesting, vec!["POST /orders"]);
}

#[test]
fn test_cli_ignore_schema() {
    let value = run_json(&[
        &fixture("shop.yaml"),
        "--format",
        "json",
        "--ignore-schema",
        "Legacy*",
        "--quiet",
    ]);

    let findings = value["specs"][0]["findings"].as_array().unwrap();
    assert!(!findings.iter().any(|f| f["kind"]["type"] == "similar_schemas"));
    assert_eq!(
        findings.iter().filter(|f| f["kind"]["type"] == "unused_schema").count(),
        1
    );
}

// ============================================================================
// Exit Status Tests
// ============================================================================

#[test]
fn test_cli_fail_on_findings() {
    specscope()
        .args([fixture("shop.yaml").as_str(), "--fail-on-findings", "--quiet"])
        .assert()
        .code(1);
}

#[test]
fn test_cli_clean_spec_passes() {
    specscope()
        .args([fixture("petstore.json").as_str(), "--fail-on-findings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

// ============================================================================
// Discovery Tests
// ============================================================================

#[test]
fn test_cli_directory_scan_skips_non_openapi() {
    let value = run_json(&[
        fixtures_path().to_str().unwrap(),
        "--format",
        "json",
        "--quiet",
    ]);

    assert_eq!(value["summary"]["specs"], 2);
    let sources: Vec<&str> = value["specs"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["source"].as_str())
        .collect();
    assert!(sources.iter().all(|s| !s.ends_with("ci.yml")));
}

#[test]
fn test_cli_parallel_matches_sequential() {
    let sequential = run_json(&[
        fixtures_path().to_str().unwrap(),
        "--format",
        "json",
        "--quiet",
    ]);
    let parallel = run_json(&[
        fixtures_path().to_str().unwrap(),
        "--format",
        "json",
        "--parallel",
        "--quiet",
    ]);

    assert_eq!(sequential, parallel);
}

// ============================================================================
// Baseline Tests
// ============================================================================

#[test]
fn test_cli_baseline_round_trip() {
    let dir = TempDir::new().unwrap();
    let baseline = dir.path().join("baseline.json");

    specscope()
        .args([
            fixture("shop.yaml").as_str(),
            "--generate-baseline",
            baseline.to_str().unwrap(),
            "--quiet",
        ])
        .assert()
        .success();
    assert!(baseline.exists());

    let value = run_json(&[
        &fixture("shop.yaml"),
        "--format",
        "json",
        "--baseline",
        baseline.to_str().unwrap(),
        "--quiet",
    ]);
    assert_eq!(value["total_issues"], 0);

    specscope()
        .args([
            fixture("shop.yaml").as_str(),
            "--baseline",
            baseline.to_str().unwrap(),
            "--fail-on-findings",
            "--quiet",
        ])
        .assert()
        .success();
}

#[test]
fn test_cli_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("specscope.yml");
    std::fs::write(
        &config,
        "detection:\n  taint: false\n  similarity: false\nreport:\n  format: json\n",
    )
    .unwrap();

    let value = run_json(&[
        &fixture("shop.yaml"),
        "--config",
        config.to_str().unwrap(),
        "--quiet",
    ]);

    let kinds: Vec<&str> = value["specs"][0]["findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["kind"]["type"].as_str())
        .collect();
    assert!(!kinds.contains(&"sensitive_data_exposure"));
    assert!(!kinds.contains(&"similar_schemas"));
    assert!(kinds.contains(&"shadowed_path"));
}
