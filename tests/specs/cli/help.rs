// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;
use yare::parameterized;

#[test]
fn edq_without_arguments_fails_with_usage() {
    edq()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_describes_the_tool() {
    edq()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline action queue"))
        .stdout(predicate::str::contains("Quickstart"));
}

#[test]
fn version_flag() {
    edq()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[parameterized(
    init = { "init" },
    new = { "new" },
    triage = { "triage" },
    status = { "status" },
    pending = { "pending" },
    sync = { "sync" },
    retry = { "retry" },
    state = { "state" },
    purge = { "purge" },
    board = { "board" },
    watch = { "watch" },
)]
fn command_supports_help_flag(cmd: &str) {
    edq()
        .args([cmd, "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[parameterized(
    new = { "new" },
    triage = { "triage" },
    status = { "status" },
)]
fn submit_commands_offer_offline(cmd: &str) {
    edq()
        .args([cmd, "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--offline"));
}
