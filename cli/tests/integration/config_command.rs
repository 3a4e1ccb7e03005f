//! Integration tests for `autoship config`.
//!
//! Every test points `AUTOSHIP_CONFIG` at a temp path so nothing reads or
//! writes `~/.autoship/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn autoship() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autoship"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

#[test]
fn test_config_show_without_file_prints_defaults() {
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "show"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("aws.region"))
        .stdout(predicate::str::contains("us-east-1"))
        .stdout(predicate::str::contains("AUTOSHIP_CONFIG"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "show"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_persists_value() {
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "set", "aws.region", "eu-west-2"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set aws.region = eu-west-2"));

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("eu-west-2"), "got: {content}");

    autoship()
        .args(["config", "show", "--json"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"region\": \"eu-west-2\""));
}

#[cfg(unix)]
#[test]
fn test_config_set_writes_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "set", "deploy.lock_max_attempts", "12"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "set", "aws.password", "hunter2"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_value_fails() {
    let (_dir, path) = temp_config_path();
    autoship()
        .args(["config", "set", "deploy.lock_max_attempts", "0"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn test_config_error_in_json_mode_is_an_error_object() {
    let (_dir, path) = temp_config_path();
    let out = autoship()
        .args(["--json", "config", "set", "nope", "1"])
        .env("AUTOSHIP_CONFIG", &path)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "error");
}
