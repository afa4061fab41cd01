//! Integration tests for the `branchwatch` CLI binary.
//!
//! Argument parsing, help output, completions and exit codes run without a
//! backend; the session tests point `--server` at a wiremock instance.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `branchwatch` binary with env isolation.
///
/// Clears all `BRANCHWATCH_*` env vars and points the config and data
/// directories at `home` so tests never touch the user's real files.
fn branchwatch_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("branchwatch");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("BRANCHWATCH_PROFILE")
        .env_remove("BRANCHWATCH_SERVER")
        .env_remove("BRANCHWATCH_OUTPUT")
        .env_remove("BRANCHWATCH_INSECURE")
        .env_remove("BRANCHWATCH_TIMEOUT")
        .env_remove("BRANCHWATCH_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn session_file(home: &Path) -> PathBuf {
    home.join("data")
        .join("branchwatch")
        .join("sessions")
        .join("default.json")
}

fn write_session(home: &Path, token: &str) {
    let file = session_file(home);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(&file, json!({ "token": token }).to_string()).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = branchwatch_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("restaurants")
                .and(predicate::str::contains("branches"))
                .and(predicate::str::contains("watch"))
                .and(predicate::str::contains("login")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("branchwatch"));
}

#[test]
fn completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("branchwatch"));
}

#[test]
fn invalid_output_format_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .args(["-o", "xml", "whoami"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ── Without a session ───────────────────────────────────────────────

#[test]
fn whoami_without_session_exits_with_auth_code() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .arg("whoami")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("branchwatch login"));
}

#[test]
fn listing_without_session_sends_nothing() {
    let home = tempfile::tempdir().unwrap();
    // Nothing listens on this port; reaching it would be exit code 7.
    branchwatch_cmd(home.path())
        .args(["--server", "http://127.0.0.1:9", "branches", "list"])
        .assert()
        .code(3);
}

#[test]
fn incomplete_restaurant_form_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "tok");
    branchwatch_cmd(home.path())
        .args([
            "--server",
            "http://127.0.0.1:9",
            "restaurants",
            "add",
            "--name",
            "Kebapci",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Address: required"));
}

#[test]
fn delete_without_terminal_requires_yes() {
    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "tok");
    branchwatch_cmd(home.path())
        .args(["--server", "http://127.0.0.1:9", "branches", "delete", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn config_show_works_without_file() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("check_interval = 300"));
}

#[test]
fn config_set_then_use() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .args(["-p", "office", "config", "set", "server", "http://10.0.0.5:8000"])
        .assert()
        .success();
    branchwatch_cmd(home.path())
        .args(["config", "use", "office"])
        .assert()
        .success();
    branchwatch_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("default_profile = \"office\"")
                .and(predicate::str::contains("http://10.0.0.5:8000")),
        );
}

#[test]
fn config_set_rejects_zero_interval() {
    let home = tempfile::tempdir().unwrap();
    branchwatch_cmd(home.path())
        .args(["config", "set", "check_interval", "0"])
        .assert()
        .code(2);
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn login_stores_session_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({ "email": "ops@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "user": { "id": 1, "email": "ops@example.com", "first_name": "Ada", "last_name": "K" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = branchwatch_cmd(home.path());
    cmd.args([
        "--server",
        &server.uri(),
        "login",
        "--email",
        "ops@example.com",
        "--password-stdin",
    ])
    .write_stdin("secret\n");
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Logged in as Ada K"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(session_file(home.path())).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "abc123");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_login_shows_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Şifre hatalı" })),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = branchwatch_cmd(home.path());
    cmd.args([
        "--server",
        &server.uri(),
        "login",
        "--email",
        "ops@example.com",
        "--password-stdin",
    ])
    .write_stdin("wrong\n");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Şifre hatalı"));
    assert!(!session_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn restaurants_list_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/restaurants/"))
        .and(header("Authorization", "Token tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Kebapci", "branches": [],
              "total_branches": 2, "online_branches": 1, "offline_branches": 1 }
        ])))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "tok");
    let mut cmd = branchwatch_cmd(home.path());
    cmd.args(["--server", &server.uri(), "-o", "json", "restaurants", "list"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["name"], "Kebapci");
    assert_eq!(listed[0]["online_branches"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/branches/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Invalid token."
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_session(home.path(), "stale");
    let mut cmd = branchwatch_cmd(home.path());
    cmd.args(["--server", &server.uri(), "branches", "list"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Session expired"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(session_file(home.path())).unwrap())
            .unwrap();
    assert!(stored["token"].is_null());
}
