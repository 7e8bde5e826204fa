// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Case service abstraction.
//!
//! Provides a trait-based client layer that enables:
//! - Real REST calls to the hospital case service for production
//! - Mock services for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use edq_core::FailureKind;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Header carrying the client-generated idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const MAX_LOG_BODY_CHARS: usize = 300;

/// Error type for case service calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The server could not be reached, or failed transiently.
    #[error("network error: {0}")]
    Network(String),

    /// The server refused the request.
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The server answered with a body we could not read.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// True when the failure means the server is unreachable.
    pub fn is_network(&self) -> bool {
        matches!(self, ServiceError::Network(_))
    }

    /// How a replay failure with this error is reported.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ServiceError::Network(_) => FailureKind::Network,
            ServiceError::Rejected { .. } | ServiceError::Decode(_) => FailureKind::Rejected,
        }
    }
}

/// Result type for case service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Boxed future returned by [`CaseService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = ServiceResult<T>> + Send + 'a>>;

/// An emergency case as returned by the server.
///
/// Only the id matters to the queue; the remaining fields are carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Case service trait.
///
/// Every mutating call carries an idempotency key so a replay of a request
/// the server already applied does not apply it twice.
pub trait CaseService: Send + Sync {
    /// Register a new case.
    fn create_case(&self, data: Value, idempotency_key: String) -> ServiceFuture<'_, Case>;

    /// Record triage fields for a case.
    fn update_triage(
        &self,
        case_id: String,
        data: Value,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case>;

    /// Change the status of a case.
    fn update_status(
        &self,
        case_id: String,
        status: String,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case>;

    /// Fetch the live board of active cases.
    fn live_board(&self) -> ServiceFuture<'_, Vec<Case>>;
}

/// Statuses worth retrying later: timeouts, throttling and server faults.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Classify a reqwest failure that produced no HTTP status.
pub fn classify_transport_error(err: &reqwest::Error) -> ServiceError {
    if err.is_decode() {
        ServiceError::Decode(err.to_string())
    } else {
        // Connect, timeout, request and body failures all mean no usable answer
        ServiceError::Network(err.to_string())
    }
}

/// Classify a non-2xx response.
pub fn classify_status(status: u16, body: &str) -> ServiceError {
    let message = error_message(body);
    if is_transient_status(status) {
        ServiceError::Network(format!("server returned {status}: {message}"))
    } else {
        ServiceError::Rejected { status, message }
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error", "detail"] {
            if let Some(msg) = value.get(field).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        truncate(trimmed)
    }
}

fn truncate(body: &str) -> String {
    let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
    if body.chars().count() > MAX_LOG_BODY_CHARS {
        preview.push_str("...");
    }
    preview
}

/// REST implementation of [`CaseService`] using reqwest.
#[derive(Debug, Clone)]
pub struct HttpCaseService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCaseService {
    /// Create a client for the case service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> ServiceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpCaseService {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/cases/{case_id}/{action}`, with the case id escaped as one
    /// path segment.
    fn case_url(&self, case_id: &str, action: &str) -> ServiceResult<reqwest::Url> {
        let invalid =
            || ServiceError::Network(format!("invalid case service URL: {}", self.base_url));
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["cases", case_id, action]);
        Ok(url)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> ServiceResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !status.is_success() {
            tracing::debug!(status = %status, body = %truncate(&body), "case service error response");
            return Err(classify_status(status.as_u16(), &body));
        }

        tracing::debug!(status = %status, "case service response");
        serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

impl CaseService for HttpCaseService {
    fn create_case(&self, data: Value, idempotency_key: String) -> ServiceFuture<'_, Case> {
        Box::pin(async move {
            let url = format!("{}/cases", self.base_url);
            let request = self
                .client
                .post(&url)
                .header(IDEMPOTENCY_HEADER, idempotency_key)
                .json(&data);
            self.send(request).await
        })
    }

    fn update_triage(
        &self,
        case_id: String,
        data: Value,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        Box::pin(async move {
            let url = self.case_url(&case_id, "triage")?;
            let request = self
                .client
                .patch(url)
                .header(IDEMPOTENCY_HEADER, idempotency_key)
                .json(&data);
            self.send(request).await
        })
    }

    fn update_status(
        &self,
        case_id: String,
        status: String,
        idempotency_key: String,
    ) -> ServiceFuture<'_, Case> {
        Box::pin(async move {
            let url = self.case_url(&case_id, "status")?;
            let request = self
                .client
                .patch(url)
                .header(IDEMPOTENCY_HEADER, idempotency_key)
                .json(&json!({ "status": status }));
            self.send(request).await
        })
    }

    fn live_board(&self) -> ServiceFuture<'_, Vec<Case>> {
        Box::pin(async move {
            let url = format!("{}/cases/live", self.base_url);
            self.send(self.client.get(&url)).await
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
