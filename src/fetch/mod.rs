//! Resilient HTTP fetching: per-attempt timeout, failure classification,
//! exponential backoff with jitter, cooperative cancellation.
//!
//! The network itself sits behind [`Transport`] so the retry machinery can be
//! driven by scripted transports in tests.

pub mod http;
pub mod policy;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use policy::RetryPolicy;

/// Statuses that signal a caller or policy problem. Retrying will not help.
pub const CLIENT_ERROR_STATUSES: [u16; 5] = [400, 401, 403, 404, 429];

/// Sent on every request; topic lists change between calls.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Prepend the no-cache directives. Headers the caller already set win.
    fn with_no_cache(&self) -> Self {
        let mut headers: Vec<(String, String)> = NO_CACHE_HEADERS
            .iter()
            .filter(|(name, _)| {
                !self
                    .headers
                    .iter()
                    .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        headers.extend(self.headers.iter().cloned());
        Self {
            headers,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One round trip to the network. Errors mean the exchange itself failed
/// (DNS, connect, reset); HTTP error statuses come back as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> Result<RawResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    NetworkError,
    ClientError,
    ServerError,
    ParseError,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {status}")]
    Client { status: u16, detail: Option<String> },

    #[error("HTTP error! status: {status}")]
    Server { status: u16, detail: Option<String> },

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Classify a completed exchange. `None` for 2xx.
    pub fn from_status(status: u16, body: &str) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }
        let detail = error_detail(body);
        if CLIENT_ERROR_STATUSES.contains(&status) {
            Some(FetchError::Client { status, detail })
        } else {
            Some(FetchError::Server { status, detail })
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout { .. } => FailureKind::Timeout,
            FetchError::Network(_) => FailureKind::NetworkError,
            FetchError::Client { .. } => FailureKind::ClientError,
            FetchError::Server { .. } => FailureKind::ServerError,
            FetchError::Parse(_) => FailureKind::ParseError,
            FetchError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Timeout
                | FailureKind::NetworkError
                | FailureKind::ServerError
                | FailureKind::ParseError
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Client { status, .. } | FetchError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied `message`, if the error body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            FetchError::Client { detail, .. } | FetchError::Server { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Runs one logical fetch as a strictly sequential series of attempts.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch `request` and decode the body as `T`.
    ///
    /// A body that fails to decode counts as a retryable `ParseError`.
    /// Semantic validation of a decoded body is the caller's business and is
    /// never retried here.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: &FetchRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        let request = request.with_no_cache();
        let mut attempt: u32 = 0;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(url = %request.url, attempt, "fetch cancelled in flight");
                    return Err(FetchError::Cancelled);
                }
                r = self.attempt::<T>(&request, policy) => r,
            };

            let err = match result {
                Ok(value) => {
                    tracing::debug!(url = %request.url, attempt, "fetch succeeded");
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !err.is_retryable() || attempt >= policy.max_retries {
                tracing::warn!(
                    url = %request.url,
                    attempt,
                    kind = ?err.kind(),
                    error = %err,
                    "fetch failed"
                );
                return Err(err);
            }

            let delay = policy.backoff_delay(attempt, &mut rand::thread_rng());
            tracing::warn!(
                url = %request.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "fetch attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(url = %request.url, attempt, "fetch cancelled during backoff");
                    return Err(FetchError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        request: &FetchRequest,
        policy: &RetryPolicy,
    ) -> Result<T, FetchError> {
        let resp = match tokio::time::timeout(policy.timeout(), self.transport.send(request)).await
        {
            Err(_) => {
                return Err(FetchError::Timeout {
                    timeout_ms: policy.timeout_ms,
                })
            }
            Ok(Err(e)) => return Err(FetchError::Network(format!("{:#}", e))),
            Ok(Ok(resp)) => resp,
        };

        if let Some(err) = FetchError::from_status(resp.status, &resp.body) {
            return Err(err);
        }

        serde_json::from_str(&resp.body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
