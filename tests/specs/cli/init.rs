// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn creates_edq_directory() {
    let temp = TempDir::new().unwrap();

    edq()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized station"))
        .stdout(predicate::str::contains("Case service: not configured"));

    assert!(temp.path().join(".edq/config.toml").exists());
    assert!(temp.path().join(".edq/queue.db").exists());
    let gitignore = std::fs::read_to_string(temp.path().join(".edq/.gitignore")).unwrap();
    assert!(gitignore.contains("queue.db"));
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    edq()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn server_is_written_to_config() {
    let temp = TempDir::new().unwrap();

    edq()
        .args(["init", "--server", "https://his.example.org/api/ed/"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Case service: https://his.example.org/api/ed",
        ));

    let config = std::fs::read_to_string(temp.path().join(".edq/config.toml")).unwrap();
    assert!(config.contains("url = \"https://his.example.org/api/ed\""));
}

#[test]
fn invalid_server_is_rejected() {
    let temp = TempDir::new().unwrap();

    edq()
        .args(["init", "--server", "his.example.org"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid server url"));

    assert!(!temp.path().join(".edq").exists());
}

#[test]
fn path_option_initializes_elsewhere() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("bay-2");

    edq()
        .args(["init", "--path"])
        .arg(&target)
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(target.join(".edq/config.toml").exists());
    assert!(!temp.path().join(".edq").exists());
}

#[test]
fn commands_outside_a_station_fail() {
    let temp = TempDir::new().unwrap();

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn directory_flag_finds_station() {
    let temp = init_temp();
    let elsewhere = TempDir::new().unwrap();

    edq()
        .arg("-C")
        .arg(temp.path())
        .arg("pending")
        .current_dir(elsewhere.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions"));
}
