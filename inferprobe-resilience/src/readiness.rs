//! Readiness polling with a fixed interval

use crate::shutdown::ShutdownSignal;
use chrono::Utc;
use inferprobe_config::ReadinessConfig;
use inferprobe_core::{ProbeAttempt, RequestOutcome};
use inferprobe_http::{HttpRequest, RequestExecutor};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Ready means a response with this status
const READY_STATUS: u16 = 200;

/// How often and how long to poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Maximum number of health checks; 0 gives up without probing
    pub max_attempts: u32,

    /// Fixed pause after each failed attempt except the last
    pub interval: Duration,

    /// Timeout handed to the executor for each attempt
    pub attempt_timeout: Duration,
}

impl ReadinessPolicy {
    pub fn new(max_attempts: u32, interval: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            attempt_timeout,
        }
    }
}

impl From<&ReadinessConfig> for ReadinessPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self::new(config.max_attempts, config.interval, config.attempt_timeout)
    }
}

/// Terminal result of a readiness loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessResult {
    pub ready: bool,
    pub attempts_used: u32,
    /// Outcome of the final attempt; absent when no attempt was made
    pub last_outcome: Option<RequestOutcome>,
    /// Time from the first attempt to the terminal result
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ReadinessResult {
    /// Convert exhaustion into an error for `?` propagation
    pub fn into_result(self) -> Result<ReadinessResult, ProbeError> {
        if self.ready {
            return Ok(self);
        }
        Err(ProbeError::Exhausted {
            attempts: self.attempts_used,
            last_reason: self
                .last_outcome
                .as_ref()
                .and_then(|o| o.error_reason().map(str::to_string)),
        })
    }
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

/// Readiness errors
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ProbeError {
    #[error("Service not ready after {attempts} attempts{}", reason_suffix(.last_reason))]
    Exhausted {
        attempts: u32,
        last_reason: Option<String>,
    },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

/// Polls a health endpoint until it answers 200 or the budget runs out
pub struct ReadinessProber {
    executor: Arc<dyn RequestExecutor>,
    policy: ReadinessPolicy,
    shutdown: Option<ShutdownSignal>,
}

impl ReadinessProber {
    pub fn new(executor: Arc<dyn RequestExecutor>, policy: ReadinessPolicy) -> Self {
        Self {
            executor,
            policy,
            shutdown: None,
        }
    }

    /// Stop polling once `shutdown` fires; the result is then not ready
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }

    async fn pause(&self) {
        match &self.shutdown {
            Some(signal) => {
                tokio::select! {
                    _ = sleep(self.policy.interval) => {}
                    _ = signal.triggered() => {}
                }
            }
            None => sleep(self.policy.interval).await,
        }
    }

    /// Run the loop against `request`.
    ///
    /// Each attempt calls the executor exactly once. Any outcome other than
    /// HTTP 200 (including a transport failure) is followed by a pause of
    /// `interval`, except after the final attempt.
    pub async fn wait_until_ready(&self, request: &HttpRequest) -> ReadinessResult {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts;

        if max_attempts == 0 {
            warn!("Readiness check skipped: attempt budget is 0");
            return ReadinessResult {
                ready: false,
                attempts_used: 0,
                last_outcome: None,
                elapsed: Duration::ZERO,
            };
        }

        let mut last_attempt: Option<ProbeAttempt> = None;
        let mut attempts_used = 0;

        for attempt_number in 1..=max_attempts {
            if self.shutdown_requested() {
                warn!(
                    "Readiness check interrupted after {} attempt(s)",
                    attempts_used
                );
                break;
            }
            attempts_used = attempt_number;
            debug!(
                "Readiness attempt {} of {} against {}",
                attempt_number, max_attempts, request.url
            );

            let outcome = self
                .executor
                .execute(request, self.policy.attempt_timeout)
                .await;
            let ready = outcome.has_status(READY_STATUS);

            let attempt = ProbeAttempt {
                attempt_number,
                outcome,
                timestamp: Utc::now(),
            };

            if ready {
                info!(
                    "Service ready after {} attempt(s) ({:.1}ms)",
                    attempt_number,
                    attempt.outcome.latency_ms()
                );
                return ReadinessResult {
                    ready: true,
                    attempts_used: attempt_number,
                    last_outcome: Some(attempt.outcome),
                    elapsed: started.elapsed(),
                };
            }

            let reason = attempt
                .outcome
                .error_reason()
                .map(str::to_string)
                .or_else(|| attempt.outcome.status_code().map(|s| format!("HTTP {}", s)))
                .unwrap_or_else(|| "no response".to_string());
            last_attempt = Some(attempt);

            if attempt_number < max_attempts {
                debug!(
                    "Attempt {} not ready: {}. Retrying in {:?}",
                    attempt_number, reason, self.policy.interval
                );
                self.pause().await;
            } else {
                warn!(
                    "Service not ready after {} attempts: {}",
                    attempt_number, reason
                );
            }
        }

        ReadinessResult {
            ready: false,
            attempts_used,
            last_outcome: last_attempt.map(|a| a.outcome),
            elapsed: started.elapsed(),
        }
    }
}

/// One-shot readiness check against `endpoint`
pub async fn wait_until_ready(
    executor: Arc<dyn RequestExecutor>,
    endpoint: &str,
    max_attempts: u32,
    attempt_interval: Duration,
    per_attempt_timeout: Duration,
) -> ReadinessResult {
    let request = HttpRequest::get(endpoint).expect_status(READY_STATUS);
    ReadinessProber::new(
        executor,
        ReadinessPolicy::new(max_attempts, attempt_interval, per_attempt_timeout),
    )
    .wait_until_ready(&request)
    .await
}
