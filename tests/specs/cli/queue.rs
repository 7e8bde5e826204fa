// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Submitting actions while the case service is down, and inspecting the queue.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn offline_create_is_queued() {
    let temp = init_temp();

    edq()
        .args(["new", r#"{"patientId":"P1"}"#, "--offline"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued CREATE_CASE #1 (1 pending)"))
        .stdout(predicate::str::contains("local:1"));
}

#[test]
fn unreachable_service_falls_back_to_queue() {
    let temp = init_temp();

    edq()
        .args(["status", "C7", "IN_TREATMENT"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued UPDATE_STATUS #1"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("C7"))
        .stdout(predicate::str::contains("1 pending"));
}

#[test]
fn pending_lists_in_queue_order() {
    let temp = init_temp();
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);
    queue_offline(&temp, &["triage", "local:1", r#"{"level":2}"#]);
    queue_offline(&temp, &["status", "local:1", "IN_TREATMENT"]);

    let output = edq()
        .arg("pending")
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("#1"));
    assert!(lines[0].contains("CREATE_CASE"));
    assert!(lines[1].contains("UPDATE_TRIAGE"));
    assert!(lines[2].contains("UPDATE_STATUS"));
    assert_eq!(lines[3], "3 pending");
}

#[test]
fn pending_json_output() {
    let temp = init_temp();
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);
    queue_offline(&temp, &["status", "C2", "DISCHARGED"]);

    let output = edq()
        .args(["pending", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "CREATE_CASE");
    assert_eq!(records[0]["data"]["patientId"], "P1");
    assert_eq!(records[0]["synced"], false);
    assert_eq!(records[1]["case_id"], "C2");
    assert_eq!(records[1]["data"]["status"], "DISCHARGED");
    assert_ne!(records[0]["idempotency_key"], records[1]["idempotency_key"]);
}

#[test]
fn pending_type_filter() {
    let temp = init_temp();
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);
    queue_offline(&temp, &["status", "C2", "DISCHARGED"]);

    edq()
        .args(["pending", "--type", "update_status"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("UPDATE_STATUS"))
        .stdout(predicate::str::contains("CREATE_CASE").not());

    edq()
        .args(["pending", "--type", "DISCHARGE"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid action type"));
}

#[test]
fn queue_survives_between_processes() {
    let temp = init_temp();
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);
    queue_offline(&temp, &["new", r#"{"patientId":"P2"}"#]);

    // A new create gets the next id, not #1 again
    edq()
        .args(["new", r#"{"patientId":"P3"}"#, "--offline"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("#3 (3 pending)"));
}

#[test]
fn invalid_json_is_rejected() {
    let temp = init_temp();

    edq()
        .args(["new", "patient P1", "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON payload"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn unknown_local_case_is_rejected() {
    let temp = init_temp();

    edq()
        .args(["triage", "local:9", r#"{"level":1}"#, "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid action"));
}

#[test]
fn online_submit_needs_a_server() {
    let temp = TempDir::new().unwrap();
    edq().arg("init").current_dir(temp.path()).assert().success();

    edq()
        .args(["new", r#"{"patientId":"P1"}"#])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no case service configured"));

    // Offline queueing works without one
    edq()
        .args(["new", r#"{"patientId":"P1"}"#, "--offline"])
        .current_dir(temp.path())
        .assert()
        .success();
}

#[test]
fn online_submit_reaches_the_server() {
    let (url, server) = serve(1);
    let temp = init_temp_with(&url);

    edq()
        .args(["new", r#"{"patientId":"P1"}"#])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Created case C1"));

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("POST /cases HTTP/1.1"));
    assert!(requests[0].to_lowercase().contains("idempotency-key:"));

    edq()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions"));
}
