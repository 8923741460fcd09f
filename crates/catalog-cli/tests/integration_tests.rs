//! Integration tests for the catalog CLI binary.
//!
//! These tests exercise the actual compiled binary using assert_cmd.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use catalog_test_utils::{SourceTree, manifest};
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

/// Get a Command for the catalog binary
fn catalog_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("catalog"));
    cmd.env_remove("CATALOG_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Write `catalog.yaml` with one filesystem source named `local`.
fn write_config(dir: &Path, tree: &SourceTree) {
    let yaml = format!(
        "- type: filesystem\n  id: local\n  interval: 30s\n  path: \"{}\"\n",
        tree.root().display()
    );
    fs::write(dir.join("catalog.yaml"), yaml).unwrap();
}

fn workspace_with(tree: &SourceTree) -> TempDir {
    let dir = tempdir().unwrap();
    write_config(dir.path(), tree);
    dir
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_output() {
    catalog_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version_output() {
    catalog_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog"));
}

#[test]
fn test_no_command_prints_hint() {
    catalog_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog --help"));
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test]
fn test_missing_config_is_reported() {
    let dir = tempdir().unwrap();
    catalog_cmd()
        .current_dir(dir.path())
        .arg("sources")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No configuration at"));
}

#[test]
fn test_unknown_source_type_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("catalog.yaml"),
        "- type: ftp\n  interval: 1m\n",
    )
    .unwrap();

    catalog_cmd()
        .current_dir(dir.path())
        .arg("sources")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ftp"));
}

// ============================================================================
// Sync, Status and Components
// ============================================================================

#[test]
fn test_sync_then_read_back() {
    let tree = SourceTree::new();
    tree.write_manifest("api", &manifest("api").team("core"))
        .write_manifest("db", &manifest("db").id("main-db"));
    let dir = workspace_with(&tree);

    catalog_cmd()
        .current_dir(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 created"));

    catalog_cmd()
        .current_dir(dir.path())
        .arg("components")
        .assert()
        .success()
        .stdout(predicate::str::contains("main-db"))
        .stdout(predicate::str::contains("[core]"));

    catalog_cmd()
        .current_dir(dir.path())
        .args(["component", "api", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"lastSource\": \"local\""));

    let output = catalog_cmd()
        .current_dir(dir.path())
        .args(["status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(statuses[0]["sourceId"], "local");
    assert_eq!(statuses[0]["status"], "completed");
    assert_eq!(statuses[0]["componentsCount"], 2);
    assert!(statuses[0]["lastError"].is_null());
}

#[test]
fn test_sync_with_bad_manifest_succeeds_with_warning() {
    let tree = SourceTree::new();
    tree.write_manifest("good", &manifest("good"))
        .write("bad/manifest.yaml", "version: v7\nname: bad\n");
    let dir = workspace_with(&tree);

    catalog_cmd()
        .current_dir(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("WARN"))
        .stdout(predicate::str::contains("bad/manifest.yaml"));

    catalog_cmd()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 manifest(s) failed to parse"));
}

#[test]
fn test_sync_fails_when_source_is_unavailable() {
    let tree = SourceTree::new();
    let dir = workspace_with(&tree);
    drop(tree);

    catalog_cmd()
        .current_dir(dir.path())
        .arg("sync")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("1 source(s) failed"));
}

#[test]
fn test_sync_unknown_source() {
    let tree = SourceTree::new();
    let dir = workspace_with(&tree);

    catalog_cmd()
        .current_dir(dir.path())
        .args(["sync", "--source", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown source: nope"));
}

#[test]
fn test_status_before_any_run_is_idle() {
    let tree = SourceTree::new();
    let dir = workspace_with(&tree);

    catalog_cmd()
        .current_dir(dir.path())
        .args(["status", "--source", "local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("idle"))
        .stdout(predicate::str::contains("never"));
}

#[test]
fn test_component_not_found() {
    let tree = SourceTree::new();
    let dir = workspace_with(&tree);

    catalog_cmd()
        .current_dir(dir.path())
        .args(["component", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Component not found: ghost"));
}

#[test]
fn test_config_flag_and_env() {
    let tree = SourceTree::new();
    let dir = workspace_with(&tree);
    let elsewhere = tempdir().unwrap();
    let config = dir.path().join("catalog.yaml");

    catalog_cmd()
        .current_dir(elsewhere.path())
        .arg("sources")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("local"));

    catalog_cmd()
        .current_dir(elsewhere.path())
        .env("CATALOG_CONFIG", &config)
        .args(["sources", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"filesystem\""));
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_reports_each_file() {
    let tree = SourceTree::new();
    tree.write_manifest("ok", &manifest("ok"))
        .write("broken/manifest.yaml", "name: [x\n");

    catalog_cmd()
        .arg("validate")
        .arg(tree.path("ok/manifest.yaml"))
        .arg(tree.path("broken/manifest.yaml"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("INVALID"))
        .stderr(predicate::str::contains("1 invalid manifest(s)"));
}

#[test]
fn test_validate_valid_file_succeeds() {
    let tree = SourceTree::new();
    tree.write_manifest("svc", &manifest("svc").id("svc-1"));

    catalog_cmd()
        .arg("validate")
        .arg(tree.path("svc/manifest.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("svc-1"));
}
