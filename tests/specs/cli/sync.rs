// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn empty_queue_has_nothing_to_sync() {
    let temp = init_temp();

    edq()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
}

#[test]
fn sync_with_server_down_fails_and_keeps_queue() {
    let temp = init_temp();
    queue_offline(&temp, &["status", "C1", "ADMITTED"]);

    edq()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Synced 0 of 1"))
        .stdout(predicate::str::contains("[network]"))
        .stderr(predicate::str::contains("sync incomplete: 0 synced, 1 failed"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn sync_replays_in_order_and_clears_queue() {
    let (url, server) = serve(2);
    let temp = init_temp_with(&url);
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);
    queue_offline(&temp, &["triage", "local:1", r#"{"level":2}"#]);

    edq()
        .arg("sync")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 2 of 2 action(s)"))
        .stdout(predicate::str::contains("Purged 2 synced action(s)"));

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("POST /cases HTTP/1.1"));
    assert!(requests[0].ends_with(r#"{"patientId":"P1"}"#));
    // The local reference was resolved to the id the server assigned
    assert!(requests[1].starts_with("PATCH /cases/C1/triage HTTP/1.1"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions"));
}

#[test]
fn sync_json_output() {
    let temp = init_temp();
    queue_offline(&temp, &["status", "C1", "ADMITTED"]);

    let output = edq()
        .args(["sync", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], 0);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["errors"][0]["id"], 1);
    assert_eq!(report["errors"][0]["kind"], "network");
}

#[test]
fn retry_reports_unreachable_without_failing() {
    let temp = init_temp();
    queue_offline(&temp, &["status", "C1", "ADMITTED"]);

    edq()
        .arg("retry")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("unreachable"))
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn board_fails_while_server_is_down() {
    let temp = init_temp();

    edq()
        .arg("board")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("network error"));
}
