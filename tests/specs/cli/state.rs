// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::common::*;

#[test]
fn state_offline_when_server_is_down() {
    let temp = init_temp();
    queue_offline(&temp, &["new", r#"{"patientId":"P1"}"#]);

    edq()
        .arg("state")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "State: offline (connectivity lost), 1 pending",
        ))
        .stdout(predicate::str::contains("(unreachable)"));
}

#[test]
fn state_json_output() {
    let temp = init_temp();

    let output = edq()
        .args(["state", "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["state"], "offline");
    assert_eq!(state["pending"], 0);
    assert_eq!(state["reachable"], false);
}

#[test]
fn state_online_when_server_answers() {
    let (url, server) = serve(1);
    let temp = init_temp_with(&url);

    edq()
        .arg("state")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("State: online"))
        .stdout(predicate::str::contains("(reachable)"));

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /health HTTP/1.1"));
}

#[test]
fn server_url_env_overrides_config() {
    let (url, server) = serve(1);
    let temp = init_temp();

    edq()
        .arg("state")
        .env("EDQ_SERVER_URL", &url)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("State: online"));

    server.join().unwrap();
}
