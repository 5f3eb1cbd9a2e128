//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. The effective
//! settings are read back through `info --json` and `detect --json`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
    cmd.env("PREPRESS_LOG_DIR", std::env::temp_dir().join("prepress-cli-tests"));
    cmd
}

/// Run `info --json` in `dir` and return the parsed output.
fn info(dir: &Path) -> serde_json::Value {
    let output = cmd()
        .arg("-C")
        .arg(dir)
        .args(["info", "--json"])
        .assert()
        .success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

fn log_level(dir: &Path) -> String {
    info(dir)["config"]["log_level"]
        .as_str()
        .unwrap()
        .to_string()
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info(tmp.path());
    assert!(json["config"].get("config_file").is_none());
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "debug""#).unwrap();

    let json = info(tmp.path());
    assert_eq!(json["config"]["log_level"], "debug");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".prepress.toml")
    );
}

#[test]
fn discovers_regular_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("prepress.toml"), r#"log_level = "warn""#).unwrap();
    assert_eq!(log_level(tmp.path()), "warn");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "debug""#).unwrap();

    assert_eq!(log_level(&sub_dir), "debug");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "debug""#).unwrap();
    fs::write(tmp.path().join("prepress.toml"), r#"log_level = "error""#).unwrap();

    assert_eq!(log_level(tmp.path()), "debug");
}

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("sub");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "error""#).unwrap();
    fs::write(sub_dir.join(".prepress.toml"), r#"log_level = "warn""#).unwrap();

    assert_eq!(log_level(&sub_dir), "warn");
}

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "error""#).unwrap();

    assert_eq!(log_level(&repo), "info");
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(".git")).unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "warn""#).unwrap();

    assert_eq!(log_level(tmp.path()), "warn");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.yaml"), "log_level: warn\n").unwrap();
    assert_eq!(log_level(tmp.path()), "warn");
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.yml"), "log_level: error\n").unwrap();
    assert_eq!(log_level(tmp.path()), "error");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.json"), r#"{"log_level": "debug"}"#).unwrap();
    assert_eq!(log_level(tmp.path()), "debug");
}

#[test]
fn toml_preferred_over_yaml_in_same_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "warn""#).unwrap();
    fs::write(tmp.path().join(".prepress.yaml"), "log_level: error\n").unwrap();
    assert_eq!(log_level(tmp.path()), "warn");
}

#[test]
fn explicit_config_flag_wins() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "warn""#).unwrap();
    let explicit = tmp.path().join("ci.json");
    fs::write(&explicit, r#"{"log_level": "error"}"#).unwrap();

    let output = cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("--config")
        .arg(&explicit)
        .args(["info", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["config"]["log_level"], "error");
}

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), "log_level = \n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.json"), "{ not json").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn invalid_log_level_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), r#"log_level = "loud""#).unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("info")
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".prepress.toml"),
        "log_level = \"warn\"\nsome_future_option = true\n",
    )
    .unwrap();
    assert_eq!(log_level(tmp.path()), "warn");
}

// =============================================================================
// Project Override
// =============================================================================

#[test]
fn project_type_overrides_detection() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "[package]\nversion = \"1.0.0\"\n").unwrap();
    fs::write(tmp.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();
    fs::write(tmp.path().join(".prepress.toml"), "[project]\ntype = \"node\"\n").unwrap();

    let output = cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["detect", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["ecosystem"], "node");
    assert_eq!(json["configured"], true);

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("get")
        .assert()
        .success()
        .stdout("2.0.0\n");
}

#[test]
fn ecosystem_flag_beats_configured_type() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Cargo.toml"), "[package]\nversion = \"1.0.0\"\n").unwrap();
    fs::write(tmp.path().join(".prepress.toml"), "[project]\ntype = \"node\"\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["get", "--ecosystem", "rust"])
        .assert()
        .success()
        .stdout("1.0.0\n");
}

#[test]
fn unknown_project_type_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".prepress.toml"), "[project]\ntype = \"cobol\"\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("detect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}
