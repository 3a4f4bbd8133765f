//! End-to-end tests for the stencil binary.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn stencil_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stencil"))
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture file");
    path
}

const USERS_TEMPLATE: &str = r#"{
    "source": {"table": "users", "alias": "u"},
    "projection": [{"field": "u.id"}, {"field": "u.name"}],
    "filters": {"field": "u.id", "op": "=", "param": "userId"}
}"#;

#[test]
fn test_compile_emits_sql_and_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(temp_dir.path(), "users.json", USERS_TEMPLATE);

    let output = Command::new(stencil_bin())
        .arg("compile")
        .arg("--template")
        .arg(&template)
        .arg("--param")
        .arg("userId=123")
        .output()
        .expect("failed to run stencil");

    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"sql":"SELECT u.id, u.name FROM users u WHERE u.id = :userId","parameters":{"userId":123}}"#
    );
}

#[test]
fn test_param_flag_wins_over_params_file() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(temp_dir.path(), "users.json", USERS_TEMPLATE);
    let params = write_file(temp_dir.path(), "params.json", r#"{"userId": 1}"#);

    let output = Command::new(stencil_bin())
        .arg("compile")
        .arg("--template")
        .arg(&template)
        .arg("--params")
        .arg(&params)
        .arg("--param")
        .arg("userId=2")
        .output()
        .expect("failed to run stencil");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["parameters"]["userId"], serde_json::json!(2));
}

#[test]
fn test_pretty_output_is_multiline() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(temp_dir.path(), "users.json", USERS_TEMPLATE);

    let output = Command::new(stencil_bin())
        .arg("compile")
        .arg("--template")
        .arg(&template)
        .arg("--param")
        .arg("userId=123")
        .arg("--pretty")
        .output()
        .expect("failed to run stencil");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 1, "expected pretty JSON: {}", stdout);
    assert!(stdout.contains("\"sql\""));
}

#[test]
fn test_missing_parameter_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(temp_dir.path(), "users.json", USERS_TEMPLATE);

    let output = Command::new(stencil_bin())
        .arg("compile")
        .arg("--template")
        .arg(&template)
        .output()
        .expect("failed to run stencil");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("userId"), "stderr: {}", stderr);
}

#[test]
fn test_blocked_delete_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(
        temp_dir.path(),
        "purge.json",
        r#"{"operation": "DELETE", "source": {"table": "sessions"}}"#,
    );

    let output = Command::new(stencil_bin())
        .arg("compile")
        .arg("--template")
        .arg(&template)
        .output()
        .expect("failed to run stencil");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unsafe operation"), "stderr: {}", stderr);
}

#[test]
fn test_check_valid_template() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(temp_dir.path(), "users.json", USERS_TEMPLATE);

    let output = Command::new(stencil_bin())
        .arg("check")
        .arg("--template")
        .arg(&template)
        .output()
        .expect("failed to run stencil");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("OK: SELECT template for 'users'"),
        "stdout: {}",
        stdout
    );
}

#[test]
fn test_check_rejects_unknown_operation() {
    let temp_dir = TempDir::new().unwrap();
    let template = write_file(
        temp_dir.path(),
        "bad.json",
        r#"{"operation": "TRUNCATE", "source": {"table": "logs"}}"#,
    );

    let output = Command::new(stencil_bin())
        .arg("check")
        .arg("--template")
        .arg(&template)
        .output()
        .expect("failed to run stencil");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a valid template"), "stderr: {}", stderr);
}
