//! Structured result of one CLI invocation

use inferprobe_core::{HealthReport, StageReport, StressReport};
use inferprobe_execution::EndpointCheck;
use inferprobe_http::HealthResponse;
use inferprobe_resilience::ReadinessResult;
use serde::Serialize;
use std::process::ExitCode;

/// Everything the requested mode produced. Sections that did not run stay
/// empty and are left out of the JSON document.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ReadinessResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<HealthResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<HealthReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single: Option<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressReport>,
    /// Benchmarks that could not start
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Ctrl-C cut the run short
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub interrupted: bool,
}

impl RunReport {
    /// Failures that make the run unsuccessful. Endpoint checks and
    /// monitoring results are informational only.
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();

        if let Some(readiness) = &self.readiness {
            if !readiness.ready {
                failures.push(format!(
                    "service not ready after {} attempts",
                    readiness.attempts_used
                ));
            }
        }

        for stage in [&self.single, &self.load].into_iter().flatten() {
            if stage.is_failed() {
                failures.push(format!("{} failed", stage.spec.name));
            }
        }

        if let Some(stress) = &self.stress {
            if stress.halted {
                failures.push(format!(
                    "stress test halted after {} of {} stages",
                    stress.stages.len(),
                    stress.planned_stages
                ));
            }
        }

        if self.interrupted || self.stress.as_ref().is_some_and(|s| s.interrupted) {
            failures.push("interrupted".to_string());
        }

        failures.extend(self.errors.iter().cloned());
        failures
    }

    pub fn is_success(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        }
    }
}
