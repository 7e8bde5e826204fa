// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn default_purge_keeps_unsynced_actions() {
    let temp = init_temp();
    queue_offline(&temp, &["status", "C1", "ADMITTED"]);

    edq()
        .arg("purge")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 synced action(s)"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn purge_all_discards_everything() {
    let temp = init_temp();
    queue_offline(&temp, &["status", "C1", "ADMITTED"]);
    queue_offline(&temp, &["status", "C2", "ADMITTED"]);

    edq()
        .args(["purge", "--all"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 action(s)"))
        .stderr(predicate::str::contains("warning: discarded 2 action(s)"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions"));
}
