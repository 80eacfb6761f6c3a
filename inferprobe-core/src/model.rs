//! Records produced by the prober, monitor, load generator and orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::RequestOutcome;
use crate::stats::{AggregateStats, FailureBreakdown};

/// One iteration of the readiness loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeAttempt {
    /// 1-based attempt number
    pub attempt_number: u32,
    pub outcome: RequestOutcome,
    pub timestamp: DateTime<Utc>,
}

/// One health check taken during a monitoring session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSample {
    pub timestamp: DateTime<Utc>,
    pub outcome: RequestOutcome,
}

/// Uptime and latency over one monitoring session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSummary {
    pub total_samples: usize,
    pub healthy_samples: usize,
    /// `healthy / total * 100`, 0 when no sample was taken
    pub uptime_pct: f64,
    /// Latency figures over healthy samples; absent when there were none
    pub avg_latency_ms: Option<f64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
}

impl HealthSummary {
    pub fn from_samples(samples: &[HealthSample]) -> Self {
        let total_samples = samples.len();
        let latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.outcome.is_success())
            .map(|s| s.outcome.latency_ms())
            .collect();
        let healthy_samples = latencies.len();

        let uptime_pct = if total_samples == 0 {
            0.0
        } else {
            100.0 * healthy_samples as f64 / total_samples as f64
        };

        let avg_latency_ms = if latencies.is_empty() {
            None
        } else {
            Some(latencies.iter().sum::<f64>() / healthy_samples as f64)
        };

        Self {
            total_samples,
            healthy_samples,
            uptime_pct,
            avg_latency_ms,
            min_latency_ms: latencies.iter().copied().reduce(f64::min),
            max_latency_ms: latencies.iter().copied().reduce(f64::max),
        }
    }
}

/// All samples of a monitoring session plus their summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub samples: Vec<HealthSample>,
    pub summary: HealthSummary,
}

impl HealthReport {
    pub fn new(samples: Vec<HealthSample>) -> Self {
        let summary = HealthSummary::from_samples(&samples);
        Self { samples, summary }
    }
}

/// One request issued by the load generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadResult {
    /// Position of the request within its run, starting at 0
    pub request_index: usize,
    pub outcome: RequestOutcome,
    /// Latency reported by the service in its response body. Never the same
    /// thing as `outcome.latency_ms()`, which is observed by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_reported_latency_ms: Option<f64>,
}

/// One step of an escalating stress test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub concurrency: usize,
    pub request_count: usize,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, concurrency: usize, request_count: usize) -> Self {
        Self {
            name: name.into(),
            concurrency,
            request_count,
        }
    }

    /// Baseline, light, medium, heavy and stress stages
    pub fn default_sequence() -> Vec<StageSpec> {
        vec![
            StageSpec::new("Baseline", 1, 10),
            StageSpec::new("Light Load", 5, 25),
            StageSpec::new("Medium Load", 10, 50),
            StageSpec::new("Heavy Load", 20, 100),
            StageSpec::new("Stress Load", 50, 200),
        ]
    }
}

/// How a stage ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed {
        stats: AggregateStats,
        failures: FailureBreakdown,
    },
    /// No request in the stage succeeded (or the stage could not run)
    Failed {
        requests: usize,
        failures: usize,
        reason: String,
    },
}

/// Result of one stage of a stress test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub spec: StageSpec,
    pub outcome: StageOutcome,
}

impl StageReport {
    pub fn stats(&self) -> Option<&AggregateStats> {
        match &self.outcome {
            StageOutcome::Completed { stats, .. } => Some(stats),
            StageOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, StageOutcome::Failed { .. })
    }
}

/// Ordered stage reports of one stress-test session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressReport {
    pub stages: Vec<StageReport>,
    /// A stage produced no successes and the remaining stages were skipped
    pub halted: bool,
    /// A shutdown was requested and the remaining stages were skipped
    pub interrupted: bool,
    /// Number of stages that were configured
    pub planned_stages: usize,
}

impl StressReport {
    pub fn is_success(&self) -> bool {
        !self.halted && !self.interrupted && self.stages.iter().all(|s| !s.is_failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::ErrorKind;
    use std::time::Duration;

    fn sample(outcome: RequestOutcome) -> HealthSample {
        HealthSample {
            timestamp: Utc::now(),
            outcome,
        }
    }

    #[test]
    fn test_health_summary_uptime_and_latency() {
        let samples = vec![
            sample(RequestOutcome::succeeded(200, Duration::from_millis(10), None)),
            sample(RequestOutcome::failed(
                ErrorKind::Transport,
                Duration::from_millis(1),
                "connection refused",
            )),
            sample(RequestOutcome::succeeded(200, Duration::from_millis(30), None)),
            sample(RequestOutcome::rejected(503, Duration::from_millis(5), None, "HTTP 503")),
        ];
        let report = HealthReport::new(samples);

        assert_eq!(report.summary.total_samples, 4);
        assert_eq!(report.summary.healthy_samples, 2);
        assert_eq!(report.summary.uptime_pct, 50.0);
        assert_eq!(report.summary.avg_latency_ms, Some(20.0));
        assert_eq!(report.summary.min_latency_ms, Some(10.0));
        assert_eq!(report.summary.max_latency_ms, Some(30.0));
    }

    #[test]
    fn test_health_summary_without_samples() {
        let summary = HealthSummary::from_samples(&[]);

        assert_eq!(summary.uptime_pct, 0.0);
        assert!(summary.avg_latency_ms.is_none());
        assert!(summary.min_latency_ms.is_none());
    }

    #[test]
    fn test_default_sequence_escalates() {
        let stages = StageSpec::default_sequence();
        assert_eq!(stages.len(), 5);
        assert!(stages
            .windows(2)
            .all(|w| w[0].concurrency < w[1].concurrency && w[0].request_count < w[1].request_count));
        assert_eq!(stages[0].name, "Baseline");
    }

    #[test]
    fn test_failed_stage_has_no_stats() {
        let report = StageReport {
            spec: StageSpec::new("Baseline", 1, 5),
            outcome: StageOutcome::Failed {
                requests: 5,
                failures: 5,
                reason: "all requests failed".to_string(),
            },
        };

        assert!(report.is_failed());
        assert!(report.stats().is_none());
    }
}
