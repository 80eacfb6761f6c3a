//! Circuit breaker for staged load

use log::warn;
use serde::Serialize;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Work continues
    Closed,
    /// Remaining work is skipped
    Open,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
        }
    }
}

/// Opens after `failure_threshold` consecutive failed units of work and
/// stays open. A stress sequence never resumes once halted, so there is no
/// half-open recovery.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    consecutive_failures: u32,
    state: CircuitState,
    trip_reason: Option<String>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            consecutive_failures: 0,
            state: CircuitState::Closed,
            trip_reason: None,
        }
    }

    /// Open on the first failure
    pub fn single_failure() -> Self {
        Self::new(1)
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }

    /// Why the breaker opened, if it did
    pub fn trip_reason(&self) -> Option<&str> {
        self.trip_reason.as_deref()
    }

    pub fn record_success(&mut self) {
        if self.state == CircuitState::Closed {
            self.consecutive_failures = 0;
        }
    }

    pub fn record_failure(&mut self, reason: impl Into<String>) {
        if self.state == CircuitState::Open {
            return;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.failure_threshold {
            let reason = reason.into();
            warn!(
                "Circuit breaker opened after {} consecutive failure(s): {}",
                self.consecutive_failures, reason
            );
            self.state = CircuitState::Open;
            self.trip_reason = Some(reason);
        }
    }
}
