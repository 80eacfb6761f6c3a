//! Uniform outcome of a single HTTP request

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;

/// Category of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection refused, DNS failure, reset, malformed HTTP
    Transport,
    /// The per-request deadline elapsed
    Timeout,
    /// A response arrived but its status did not match the expectation
    UnexpectedStatus,
    /// A response arrived but its body did not have the expected shape
    Protocol,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UnexpectedStatus => "unexpected_status",
            ErrorKind::Protocol => "protocol",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of exactly one request.
///
/// A successful outcome always carries a status code and never an error
/// reason; a failed outcome always carries an error reason. The constructors
/// are the only way to build one, which keeps that invariant intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<JsonValue>,
    /// Raw body when it was not JSON, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    body_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
}

impl RequestOutcome {
    /// A response was received and met the caller's expectation
    pub fn succeeded(status_code: u16, latency: Duration, payload: Option<JsonValue>) -> Self {
        Self {
            success: true,
            status_code: Some(status_code),
            latency_ms: duration_to_ms(latency),
            payload,
            body_text: None,
            error_reason: None,
            error_kind: None,
        }
    }

    /// A response was received but its status did not meet the expectation
    pub fn rejected(
        status_code: u16,
        latency: Duration,
        payload: Option<JsonValue>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            status_code: Some(status_code),
            latency_ms: duration_to_ms(latency),
            payload,
            body_text: None,
            error_reason: Some(reason.into()),
            error_kind: Some(ErrorKind::UnexpectedStatus),
        }
    }

    /// No usable response was received
    pub fn failed(kind: ErrorKind, latency: Duration, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code: None,
            latency_ms: duration_to_ms(latency),
            payload: None,
            body_text: None,
            error_reason: Some(reason.into()),
            error_kind: Some(kind),
        }
    }

    /// Downgrade a received response to a protocol failure, keeping the
    /// status, latency and payload for diagnostics
    pub fn into_protocol_error(self, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error_reason: Some(reason.into()),
            error_kind: Some(ErrorKind::Protocol),
            ..self
        }
    }

    /// Attach a non-JSON response body, cut to at most `max_bytes`
    pub fn with_body_text(mut self, text: &str, max_bytes: usize) -> Self {
        let mut end = text.len().min(max_bytes);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.body_text = Some(text[..end].to_string());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Whether a response with exactly this status was received
    pub fn has_status(&self, status: u16) -> bool {
        self.status_code == Some(status)
    }

    /// Observed wall-clock latency in milliseconds
    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn payload(&self) -> Option<&JsonValue> {
        self.payload.as_ref()
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }

    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }
}

fn duration_to_ms(latency: Duration) -> f64 {
    latency.as_nanos() as f64 / 1_000_000.0
}
