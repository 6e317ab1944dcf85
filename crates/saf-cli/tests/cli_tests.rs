//! CLI integration tests

use std::process::{Command, Output};

fn saf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_saf"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("SAF_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = saf(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("SAF Miles Predictor"), "Should show app name");
    for command in ["generate", "train", "retrain", "optimize", "equilibrium", "predict", "health"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = saf(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("saf"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = saf(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in ["--tier", "--cabin", "--route", "--distance-km", "--premium", "--saf-blend"] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

/// Test that predict requires its passenger fields
#[test]
fn test_predict_requires_fields() {
    let output = saf(&["predict", "--tier", "Gold"]);
    assert!(!output.status.success(), "Predict without fields should fail");
}

/// Test dataset generation writes the CSV
#[test]
fn test_generate_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");

    let output = saf(&[
        "generate",
        "--samples",
        "25",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Generate should succeed");

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 26);
    assert!(content.starts_with("user_id,tier,cabin,route"));
}

/// Test miles-rate optimization output
#[test]
fn test_optimize_json() {
    let output = saf(&["--format", "json", "optimize", "--samples", "200", "--k", "80,100,120"]);
    assert!(output.status.success(), "Optimize should succeed");

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = result["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["k"], 80.0);
    assert_eq!(result["best_k"], 80.0);
}

/// Test equilibrium check output
#[test]
fn test_equilibrium_json() {
    let output = saf(&["--format", "json", "equilibrium", "--premium", "25", "--saf-miles", "1000"]);
    assert!(output.status.success(), "Equilibrium should succeed");

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["airline_ok"], true);
    assert_eq!(result["customer_ok"], true);
    assert_eq!(result["equilibrium"], true);
}

/// Test training writes a loadable artifact
#[test]
fn test_train_writes_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saf_model.json");

    let output = saf(&[
        "--format",
        "json",
        "train",
        "--samples",
        "200",
        "--n-estimators",
        "5",
        "--max-depth",
        "3",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Train should succeed");

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["test_rows"], 40);
    assert_eq!(result["sha256"].as_str().unwrap().len(), 64);

    let model: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(model["trees"].as_array().unwrap().len(), 5);
}

/// Test health against an unreachable server fails cleanly
#[test]
fn test_health_unreachable_server() {
    let output = saf(&["--api-url", "http://127.0.0.1:1", "health"]);
    assert!(!output.status.success(), "Health should fail without a server");
}
