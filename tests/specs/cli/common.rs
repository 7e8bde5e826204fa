// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test files,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The `edq` binary with a clean environment.
pub fn edq() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("edq").unwrap();
    cmd.env_remove("EDQ_SERVER_URL")
        .env_remove("EDQ_QUEUE")
        .env_remove("EDQ_TIMINGS")
        .env_remove("RUST_LOG");
    cmd
}

/// A base URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Helper to create a station whose case service is down.
pub fn init_temp() -> TempDir {
    init_temp_with(&unreachable_url())
}

/// Helper to create a station pointing at `server`.
pub fn init_temp_with(server: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    edq()
        .args(["init", "--server", server])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Queue an action without touching the network.
pub fn queue_offline(temp: &TempDir, args: &[&str]) {
    edq()
        .args(args)
        .arg("--offline")
        .current_dir(temp.path())
        .assert()
        .success();
}

/// Serve `count` requests with `200 {"id":"C1",...}`, then stop.
/// The handle yields the raw requests in arrival order.
pub fn serve(count: usize) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            requests.push(read_request(&mut stream));
            let body = r#"{"id":"C1","status":"WAITING"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
        requests
    });

    (url, handle)
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}
