//! CLI integration tests

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../wellness-core/tests/fixtures/artifacts")
}

/// Run the CLI with an isolated home directory so no user config leaks in
fn wellness(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("Failed to create temp home");
    Command::new(env!("CARGO_BIN_EXE_wellness"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("WELLNESS_API_URL")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = wellness(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Employee Wellness"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(
        stdout.contains("inspect-artifacts"),
        "Should show inspect-artifacts command"
    );
    assert!(stdout.contains("evaluate"), "Should show evaluate command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = wellness(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("wellness"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = wellness(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in [
        "--focus",
        "--breaks",
        "--after-hours",
        "--sentiment",
        "--department",
        "--file",
    ] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test predict requires telemetry or a file
#[test]
fn test_predict_requires_input() {
    let output = wellness(&["predict", "--focus", "35"]);
    assert!(!output.status.success(), "Partial telemetry should fail");
}

/// Test predict against an unreachable service fails cleanly
#[test]
fn test_predict_unreachable_service() {
    let output = wellness(&[
        "--api-url",
        "http://127.0.0.1:9",
        "predict",
        "--focus",
        "35",
        "--breaks",
        "0.5",
        "--after-hours",
        "60",
        "--sentiment",
        "0.5",
        "--department",
        "sales",
    ]);

    assert!(!output.status.success(), "Unreachable service should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}

/// Test inspect-artifacts on the fixture bundle
#[test]
fn test_inspect_artifacts_json() {
    let dir = fixture_dir();
    let output = wellness(&[
        "--format",
        "json",
        "inspect-artifacts",
        "--artifacts",
        dir.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "Inspect should succeed");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["classifier"], "forest");
    assert_eq!(report["version"], "unversioned");
    assert_eq!(report["labels"].as_array().unwrap().len(), 3);
    assert_eq!(report["departments"].as_array().unwrap().len(), 5);
}

/// Test inspect-artifacts table output
#[test]
fn test_inspect_artifacts_table() {
    let dir = fixture_dir();
    let output = wellness(&["inspect-artifacts", "--artifacts", dir.to_str().unwrap()]);

    assert!(output.status.success(), "Inspect should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stressed"));
    assert!(stdout.contains("scaler.json"));
}

/// Test inspect-artifacts on a missing directory fails
#[test]
fn test_inspect_artifacts_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = wellness(&[
        "inspect-artifacts",
        "--artifacts",
        dir.path().to_str().unwrap(),
    ]);

    assert!(!output.status.success(), "Empty directory should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load artifacts"));
}

/// Test evaluate over the reference profile centers
#[test]
fn test_evaluate_profile_centers() {
    let data_dir = tempfile::tempdir().unwrap();
    let data = data_dir.path().join("val_data.csv");
    std::fs::write(
        &data,
        "\
employee_id,focus_session_length_minutes,break_frequency_per_hour,after_hours_activity_minutes,communication_sentiment_score,department,wellness_label
e1,50.0,1.2,15.0,0.8,engineering,Healthy
e2,35.0,0.5,60.0,0.5,sales,Stressed
e3,20.0,0.2,90.0,0.3,hr,Burnout
e4,35.0,0.5,60.0,0.5,legal,Stressed
",
    )
    .unwrap();

    let dir = fixture_dir();
    let output = wellness(&[
        "--format",
        "json",
        "evaluate",
        "--data",
        data.to_str().unwrap(),
        "--artifacts",
        dir.to_str().unwrap(),
        "--min-accuracy",
        "0.95",
    ]);

    assert!(output.status.success(), "Evaluate should succeed");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"], 4);
    assert_eq!(report["correct"], 3);
    assert_eq!(report["rejected"]["invalid_input"], 1);
    assert_eq!(report["confusion"]["Stressed"]["Stressed"], 1);
}
