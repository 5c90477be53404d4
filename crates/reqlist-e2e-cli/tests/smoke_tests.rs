//! Smoke tests for the reqlist-e2e CLI
//!
//! Runs the binary end to end against the simulated storefront.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the reqlist-e2e binary, isolated from the caller's
/// environment and working directory
fn reqlist_e2e(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reqlist-e2e").expect("reqlist-e2e binary should exist");
    cmd.current_dir(cwd.path())
        .env_remove("REQLIST_E2E_BASE_URL")
        .env_remove("CHROMIUM_PATH")
        .env_remove("RUST_LOG");
    cmd
}

/// Fast waits so dry runs finish quickly
fn write_fast_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("fast.yaml");
    fs::write(
        &path,
        "driver: simulated\n\
         timeouts:\n  command_ms: 200\n  grid_ms: 200\n  form_ms: 200\n  alert_ms: 200\n  settle_ms: 20\n  poll_ms: 2\n",
    )
    .unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("selectors"));
}

#[test]
fn test_no_args_fails() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir).assert().failure();
}

#[test]
fn test_run_help_mentions_env() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REQLIST_E2E_BASE_URL"))
        .stdout(predicate::str::contains("--fail-fast"));
}

// ============================================================================
// list / selectors
// ============================================================================

#[test]
fn test_list_all() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("complex-existing-list"))
        .stdout(predicate::str::contains("complex-new-list"))
        .stdout(predicate::str::contains("simple-existing-list"))
        .stdout(predicate::str::contains("complex-repeat"));
}

#[test]
fn test_list_filtered() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .args(["list", "--filter", "simple"])
        .assert()
        .success()
        .stdout(predicate::str::contains("simple-existing-list"))
        .stdout(predicate::str::contains("complex-repeat").not());
}

#[test]
fn test_selectors_default_registry() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .arg("selectors")
        .assert()
        .success()
        .stdout(predicate::str::contains("navDrop"))
        .stdout(predicate::str::contains(".product-list-page__grid"));
}

#[test]
fn test_selectors_apply_config_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.yaml");
    fs::write(&config, "selectors:\n  navDrop: .mega-menu\n").unwrap();
    reqlist_e2e(&dir)
        .args(["selectors", "--yaml", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("navDrop:"))
        .stdout(predicate::str::contains(".mega-menu"))
        .stdout(predicate::str::contains(".nav-drop").not());
}

#[test]
fn test_selectors_reject_unknown_override() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("reqlist-e2e.yaml"),
        "selectors:\n  navDorp: .typo\n",
    )
    .unwrap();
    reqlist_e2e(&dir)
        .arg("selectors")
        .assert()
        .failure()
        .stderr(predicate::str::contains("navDorp"));
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_simulated_run_passes() {
    let dir = TempDir::new().unwrap();
    let config = write_fast_config(&dir);
    reqlist_e2e(&dir)
        .args(["--color", "never", "run", "--config"])
        .arg(&config)
        .args(["--output", "out"])
        .assert()
        .success()
        .stderr(predicate::str::contains("PASSED 4 scenarios"));
    assert!(dir.path().join("out/results.json").is_file());
}

#[test]
fn test_simulated_run_json_output() {
    let dir = TempDir::new().unwrap();
    let config = write_fast_config(&dir);
    let output = reqlist_e2e(&dir)
        .args(["-q", "run", "--config"])
        .arg(&config)
        .args(["--filter", "simple", "--format", "json", "--output", "out"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["driver"], "simulated");
    assert_eq!(value["results"][0]["id"], "simple-existing-list");
    assert_eq!(value["results"][0]["status"], "passed");
}

#[test]
fn test_simulated_run_tap_output() {
    let dir = TempDir::new().unwrap();
    let config = write_fast_config(&dir);
    reqlist_e2e(&dir)
        .args(["-q", "run", "--config"])
        .arg(&config)
        .args(["--format", "tap", "-j", "2", "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("TAP version 13\n1..4"))
        .stdout(predicate::str::contains("not ok").not());
}

#[test]
fn test_default_config_file_is_picked_up() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("reqlist-e2e.yaml"),
        "driver: simulated\njobs: 0\n",
    )
    .unwrap();
    reqlist_e2e(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("jobs must be at least 1"));
}

#[test]
fn test_env_base_url_is_validated() {
    let dir = TempDir::new().unwrap();
    let config = write_fast_config(&dir);
    reqlist_e2e(&dir)
        .env("REQLIST_E2E_BASE_URL", "ftp://storefront.test")
        .args(["run", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("http(s)"));
}

#[test]
fn test_empty_selection_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fast_config(&dir);
    reqlist_e2e(&dir)
        .args(["run", "--config"])
        .arg(&config)
        .args(["--filter", "checkout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
}

#[test]
fn test_unknown_driver_rejected() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .args(["run", "--driver", "firefox"])
        .assert()
        .failure();
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    reqlist_e2e(&dir)
        .args(["run", "--config", "absent.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("absent.yaml"));
}
