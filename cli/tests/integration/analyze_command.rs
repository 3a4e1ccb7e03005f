//! Integration tests for `autoship analyze` against local archives.
//!
//! The classifier API key variable is removed so the offline classifiers
//! answer; nothing here touches the network.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn autoship(config_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("autoship"));
    cmd.env("NO_COLOR", "1")
        .env("AUTOSHIP_CONFIG", config_dir.join("config.yaml"))
        .env_remove("OPENAI_API_KEY");
    cmd
}

fn write_zip(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("app.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        zip.start_file(*name, opts).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn test_analyze_flask_archive_json() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(
        dir.path(),
        &[
            ("hello/requirements.txt", "Flask==3.0\n"),
            ("hello/app.py", "app.run(host='127.0.0.1', port=5000)\n"),
            ("hello/templates/index.html", "<p>hi</p>\n"),
        ],
    );

    let out = autoship(dir.path())
        .args(["--json", "analyze", "--archive"])
        .arg(&archive)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");

    assert_eq!(value["analysis"]["framework"], "flask");
    assert_eq!(value["analysis"]["ports"], serde_json::json!([5000]));
    assert_eq!(value["analysis"]["dependency_manifest"], "requirements.txt");
    assert_eq!(value["analysis"]["main_file"], "app.py");
    assert_eq!(value["analysis"]["needs_localhost_rewrite"], true);
    let tree = value["tree"].as_str().unwrap();
    assert!(tree.starts_with("hello/"), "tree: {tree}");
    assert!(tree.contains("templates/"), "tree: {tree}");
}

#[test]
fn test_analyze_node_archive_human() {
    let dir = TempDir::new().unwrap();
    let archive = write_zip(
        dir.path(),
        &[
            (
                "package.json",
                r#"{"name":"web","dependencies":{"express":"^4.18.0"}}"#,
            ),
            ("index.js", "app.listen(3000)\n"),
        ],
    );

    autoship(dir.path())
        .args(["analyze", "--archive"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("nodejs"))
        .stdout(predicate::str::contains("3000"))
        .stdout(predicate::str::contains("package.json"));
}

#[test]
fn test_analyze_rejects_non_archive() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("notes.zip");
    std::fs::write(&bogus, "just text").unwrap();

    autoship(dir.path())
        .args(["analyze", "--archive"])
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid archive"));
}

#[test]
fn test_analyze_failure_in_json_mode_names_the_stage() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.zip");

    let out = autoship(dir.path())
        .args(["--json", "analyze", "--archive"])
        .arg(&missing)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "acquire");
}
