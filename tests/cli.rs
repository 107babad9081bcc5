//! CLI integration tests for spaceport admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use spaceport::store::{SqliteStore, Store};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn cmd(&self) -> Command {
        Command::cargo_bin("spaceport").expect("failed to find binary")
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args(["admin", "init", "--non-interactive", "--data-dir"])
            .arg(self.data_dir())
            .assert()
    }
}

#[test]
fn test_init_writes_admin_token() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Admin token"))
        .stdout(predicate::str::contains("spaceport_"));

    let token = std::fs::read_to_string(ctx.data_dir().join(".admin_token")).unwrap();
    assert!(token.starts_with("spaceport_"));
    ctx.temp_dir
        .child("spaceport.db")
        .assert(predicate::path::exists());

    let store = SqliteStore::new(ctx.data_dir().join("spaceport.db")).unwrap();
    assert!(store.has_admin_token().unwrap());
}

#[cfg(unix)]
#[test]
fn test_admin_token_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    ctx.init().success();

    let mode = std::fs::metadata(ctx.data_dir().join(".admin_token"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.init()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_serve_requires_init() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--port", "0", "--data-dir"])
        .arg(ctx.data_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_serve_rejects_bad_config() {
    let ctx = TestContext::new();
    let config = ctx.temp_dir.child("spaceport.toml");
    config.write_str("port = \"eighty\"\n").unwrap();

    ctx.cmd()
        .args(["serve", "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_serve_missing_config_file() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--config"])
        .arg(ctx.data_dir().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_serve_rejects_zero_scan_timeout() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args(["serve", "--scan-timeout-secs", "0", "--data-dir"])
        .arg(ctx.data_dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_secs"));
}
