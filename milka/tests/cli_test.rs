//! Integration tests for the milka binary
//!
//! Every run gets its own config, data and log directories so nothing from
//! the user's environment leaks in.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn milka(temp: &TempDir) -> Command {
    let config = temp.path().join("milka.yml");
    if !config.exists() {
        let yaml = format!(
            "playback:\n  tick-ms: 5\n  finish-delay-ms: 1\ndata:\n  session-file: {}\n",
            temp.path().join("session.json").display()
        );
        fs::write(&config, yaml).unwrap();
    }

    let mut cmd = Command::cargo_bin("milka").unwrap();
    cmd.env("XDG_DATA_HOME", temp.path().join("data"))
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", temp.path().join("config"))
        .arg("--config")
        .arg(&config);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("statuses"))
        .stdout(predicate::str::contains("new-chat"))
        .stdout(predicate::str::contains("Logs are written to"));
}

#[test]
fn test_statuses_lists_sample_groups() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .arg("statuses")
        .assert()
        .success()
        .stdout(predicate::str::contains("Anna"))
        .stdout(predicate::str::contains("nothing posted"));
}

#[test]
fn test_statuses_json() {
    let temp = TempDir::new().unwrap();
    let output = milka(&temp).args(["statuses", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let statuses = statuses.as_array().unwrap();
    assert_eq!(statuses.len(), 5);
    assert_eq!(statuses[1]["owner_name"], "Anna");
    assert_eq!(statuses[1]["items"].as_array().unwrap().len(), 2);
}

#[test]
fn test_local_chat_search() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["chats", "--search", "meeting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work group"))
        .stdout(predicate::str::contains("Anna Petrova").not());
}

#[test]
fn test_play_runs_to_completion() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["play", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100.0%"))
        .stdout(predicate::str::contains("done"));
}

#[test]
fn test_play_empty_group() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["play", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has not posted anything"));
}

#[test]
fn test_play_unknown_group_fails() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["play", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No status group with id 99"));
}

#[test]
fn test_whoami_and_logout_signed_out() {
    let temp = TempDir::new().unwrap();
    milka(&temp).arg("whoami").assert().success().stdout(predicate::str::contains("Not signed in"));
    milka(&temp).arg("logout").assert().success().stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn test_send_requires_session() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["send", "1", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_login_without_backend_fails() {
    let temp = TempDir::new().unwrap();
    milka(&temp)
        .args(["login", "--phone", "+1 555 0100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backend unavailable"));
}

#[test]
fn test_directory_file_overrides_sample() {
    let temp = TempDir::new().unwrap();
    let directory = temp.path().join("directory.yml");
    fs::write(
        &directory,
        "chats:\n  - id: 1\n    name: Book club\n    avatar: \"📚\"\n    last_message: Chapter 3 tonight\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("milka.yml"),
        format!("data:\n  directory-file: {}\n", directory.display()),
    )
    .unwrap();

    milka(&temp)
        .arg("chats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Book club"))
        .stdout(predicate::str::contains("Anna Petrova").not());
}
