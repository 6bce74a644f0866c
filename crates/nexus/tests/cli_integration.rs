//! CLI integration tests for the Nexus command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Local-only commands (seed, status) work end to end
//!
//! Note: These tests never call the model provider.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the nexus binary.
fn nexus() -> Command {
    Command::cargo_bin("nexus").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    nexus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nexus"))
        .stdout(predicate::str::contains("conversational lead search"));
}

#[test]
fn test_version_displays() {
    nexus()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nexus"));
}

#[test]
fn test_help_lists_subcommands() {
    nexus()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("status"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_flag_accepted() {
    nexus().args(["--verbose", "--help"]).assert().success();
}

#[test]
fn test_json_flag_accepted() {
    nexus().args(["--json", "--help"]).assert().success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_serve_help() {
    nexus()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--bind"));
}

#[test]
fn test_ask_requires_a_query() {
    nexus().arg("ask").assert().failure();
}

#[test]
fn test_seed_creates_and_populates_a_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nexus.db");

    nexus()
        .env("NEXUS_CONFIG_DIR", dir.path())
        .args(["seed", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded"));

    // Second run is a no-op
    nexus()
        .env("NEXUS_CONFIG_DIR", dir.path())
        .args(["seed", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("already populated"));
}

#[test]
fn test_status_reports_missing_keys_as_json() {
    let dir = tempfile::tempdir().unwrap();

    let output = nexus()
        .env("NEXUS_CONFIG_DIR", dir.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("SERPER_API_KEY")
        .args(["--json", "status"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["gemini_api_key_loaded"], false);
    assert_eq!(parsed["serper_api_key_loaded"], false);
}
