// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::monitor::ConnectivityProbe;
use super::service::{Case, CaseService, ServiceError, ServiceFuture, ServiceResult};

/// A call received by [`MockCaseService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { data: Value, key: String },
    Triage { case_id: String, data: Value, key: String },
    Status { case_id: String, status: String, key: String },
    Board,
}

impl Call {
    pub fn key(&self) -> Option<&str> {
        match self {
            Call::Create { key, .. } | Call::Triage { key, .. } | Call::Status { key, .. } => {
                Some(key)
            }
            Call::Board => None,
        }
    }
}

type Matcher = Box<dyn Fn(&Call) -> bool + Send + Sync>;
type Hook = Box<dyn Fn(&Call) + Send + Sync>;

/// In-memory case service that records calls and fails on demand.
#[derive(Default)]
pub struct MockCaseService {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<(Matcher, ServiceError)>>,
    offline: AtomicBool,
    created: AtomicUsize,
    hook: Mutex<Option<Hook>>,
    gate: Option<Arc<Notify>>,
}

impl MockCaseService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits on `gate` before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        MockCaseService {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// All calls fail with a network error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail calls matching `matcher` with `error`.
    pub fn fail_when(
        &self,
        matcher: impl Fn(&Call) -> bool + Send + Sync + 'static,
        error: ServiceError,
    ) {
        self.failures
            .lock()
            .unwrap()
            .push((Box::new(matcher), error));
    }

    /// Fail CREATE_CASE calls for the given patient.
    pub fn fail_patient(&self, patient_id: &str, error: ServiceError) {
        let patient_id = patient_id.to_string();
        self.fail_when(
            move |call| matches!(call, Call::Create { data, .. } if data["patientId"] == patient_id.as_str()),
            error,
        );
    }

    /// Fail update calls targeting the given case.
    pub fn fail_case(&self, case_id: &str, error: ServiceError) {
        let target = case_id.to_string();
        self.fail_when(
            move |call| match call {
                Call::Triage { case_id, .. } | Call::Status { case_id, .. } => *case_id == target,
                _ => false,
            },
            error,
        );
    }

    /// Run `hook` on every call, before it is answered.
    pub fn on_call(&self, hook: impl Fn(&Call) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: Call) -> ServiceResult<Call> {
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&call);
        }
        self.calls.lock().unwrap().push(call.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::Network("connection refused".to_string()));
        }
        for (matcher, error) in self.failures.lock().unwrap().iter() {
            if matcher(&call) {
                return Err(error.clone());
            }
        }
        Ok(call)
    }

    async fn answer(&self, call: Call) -> ServiceResult<Case> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.respond(call)? {
            Call::Create { data, .. } => {
                let n = self.created.fetch_add(1, Ordering::SeqCst);
                let mut fields = data.as_object().cloned().unwrap_or_default();
                fields.insert("status".to_string(), json!("WAITING"));
                Ok(Case {
                    id: format!("C{}", 100 + n),
                    fields,
                })
            }
            Call::Triage { case_id, data, .. } => Ok(Case {
                id: case_id,
                fields: data.as_object().cloned().unwrap_or_default(),
            }),
            Call::Status {
                case_id, status, ..
            } => Ok(case(&case_id, json!({ "status": status }))),
            Call::Board => Ok(case("board", json!({}))),
        }
    }
}

impl CaseService for MockCaseService {
    fn create_case(&self, data: Value, idempotency_key: String) -> ServiceFuture<'_, Case> {
        Box::pin(self.answer(Call::Create {
            data,
            key: idempotency_key,
        }))
    }

    fn update_triage(
        &self,
        case_id: String,
        data: Value,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        Box::pin(self.answer(Call::Triage {
            case_id,
            data,
            key: idempotency_key,
        }))
    }

    fn update_status(
        &self,
        case_id: String,
        status: String,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        Box::pin(self.answer(Call::Status {
            case_id,
            status,
            key: idempotency_key,
        }))
    }

    fn live_board(&self) -> ServiceFuture<'_, Vec<Case>> {
        Box::pin(async move {
            self.respond(Call::Board)?;
            Ok(vec![case("C1", json!({"status": "IN_TREATMENT"}))])
        })
    }
}

/// Build a case with the given id and fields.
pub fn case(id: &str, fields: Value) -> Case {
    let fields: Map<String, Value> = fields.as_object().cloned().unwrap_or_default();
    Case {
        id: id.to_string(),
        fields,
    }
}

/// Probe that answers whatever it was last told.
pub struct MockProbe {
    online: AtomicBool,
    checks: AtomicUsize,
}

impl MockProbe {
    pub fn new(online: bool) -> Arc<Self> {
        Arc::new(MockProbe {
            online: AtomicBool::new(online),
            checks: AtomicUsize::new(0),
        })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl ConnectivityProbe for MockProbe {
    fn check(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.online.load(Ordering::SeqCst)
        })
    }
}

/// Serve one HTTP response on a local port.
///
/// Returns the base URL and a handle resolving to the raw request text.
pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
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
    String::from_utf8_lossy(&buf).into_owned()
}
