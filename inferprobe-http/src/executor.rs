//! Request execution

use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::request::{HttpRequest, RequestBody};
use async_trait::async_trait;
use inferprobe_core::{ErrorKind, RequestOutcome};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Largest non-JSON body kept on an outcome
pub const MAX_BODY_TEXT_BYTES: usize = 64 * 1024;

/// Issues exactly one request and reports what happened.
///
/// Implementations never fail: transport errors, timeouts and unexpected
/// statuses are all folded into the returned [`RequestOutcome`]. There are
/// no retries at this level.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &HttpRequest, timeout: Duration) -> RequestOutcome;
}

/// [`RequestExecutor`] backed by one shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating request executor with {}ms timeout",
            config.timeout.as_millis()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()?;

        Ok(Self { client })
    }

    fn build(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<reqwest::RequestBuilder, HttpError> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    let length = part.bytes.len() as u64;
                    let file = Part::stream_with_length(part.bytes.clone(), length)
                        .file_name(part.filename.clone())
                        .mime_str(&part.content_type)?;
                    form = form.part(part.field.clone(), file);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn execute(&self, request: &HttpRequest, timeout: Duration) -> RequestOutcome {
        let started = Instant::now();
        trace!("{} {}", request.method, request.url);

        let builder = match self.build(request, timeout) {
            Ok(builder) => builder,
            Err(e) => {
                return RequestOutcome::failed(
                    ErrorKind::Transport,
                    started.elapsed(),
                    format!("invalid request: {}", e),
                )
            }
        };

        // reqwest enforces the same deadline; the outer timeout also covers
        // a body that stalls after the headers arrived
        let exchange = tokio::time::timeout(timeout, async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })
        .await;
        let latency = started.elapsed();

        let outcome = match exchange {
            Err(_) => RequestOutcome::failed(
                ErrorKind::Timeout,
                latency,
                format!("timed out after {}ms", timeout.as_millis()),
            ),
            Ok(Err(e)) => {
                let kind = if e.is_timeout() {
                    ErrorKind::Timeout
                } else {
                    ErrorKind::Transport
                };
                RequestOutcome::failed(kind, latency, describe(&e))
            }
            Ok(Ok((status, body))) => interpret(request.expected_status, status, latency, &body),
        };

        debug!(
            "{} {} -> {} in {:.1}ms",
            request.method,
            request.url,
            outcome
                .status_code()
                .map(|s| s.to_string())
                .unwrap_or_else(|| outcome.error_reason().unwrap_or("error").to_string()),
            outcome.latency_ms()
        );
        outcome
    }
}

/// Turn a received response into an outcome
pub(crate) fn interpret(
    expected_status: Option<u16>,
    status: u16,
    latency: Duration,
    body: &str,
) -> RequestOutcome {
    let payload = serde_json::from_str::<JsonValue>(body).ok();
    let keep_text = payload.is_none() && !body.is_empty();

    let outcome = match expected_status {
        Some(expected) if expected != status => RequestOutcome::rejected(
            status,
            latency,
            payload,
            format!("HTTP {} (expected {})", status, expected),
        ),
        _ => RequestOutcome::succeeded(status, latency, payload),
    };

    if keep_text {
        outcome.with_body_text(body, MAX_BODY_TEXT_BYTES)
    } else {
        outcome
    }
}

/// Error message including the underlying cause, which reqwest keeps in
/// the source chain
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
