//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a gtt command acting as a fixed user
pub fn gtt() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("gtt"));
    cmd.env("GTT_ACTOR", "tester").env_remove("GTT_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    gtt().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a command in the project and return trimmed stdout
pub fn run_ok(tmp: &TempDir, args: &[&str]) -> String {
    let output = gtt().current_dir(tmp.path()).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "gtt {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to create a GO/NOGO thread set; returns the set ID
pub fn create_test_set(tmp: &TempDir, size: &str, class: &str) -> String {
    run_ok(
        tmp,
        &[
            "set", "create", "-c", "UN", "--size", size, "--class", class, "-l", "CRIB", "-o",
            "id",
        ],
    )
}

/// Helper to receive a single spare thread gauge; returns its ID
pub fn create_test_spare(tmp: &TempDir, role: &str, size: &str, class: &str) -> String {
    run_ok(
        tmp,
        &[
            "gauge", "new", "-c", "UN", "--role", role, "--size", size, "--class", class, "-l",
            "CRIB", "-o", "id",
        ],
    )
}

/// Write a fake certificate file into the project directory
pub fn write_cert_file(tmp: &TempDir, name: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, format!("%PDF-1.4 calibration certificate {}", name)).unwrap();
    path
}

/// Upload a certificate for a gauge
pub fn upload_cert(tmp: &TempDir, gauge_id: &str, valid_until: &str) {
    let file = write_cert_file(tmp, &format!("{}.pdf", gauge_id));
    run_ok(
        tmp,
        &[
            "cal",
            "upload",
            gauge_id,
            file.to_str().unwrap(),
            "--valid-until",
            valid_until,
        ],
    );
}

/// Current status of a gauge
pub fn status_of(tmp: &TempDir, gauge_id: &str) -> String {
    run_ok(tmp, &["status", gauge_id, "-o", "id"])
}
