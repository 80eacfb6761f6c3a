//! Descriptive statistics over request outcomes
//!
//! Percentiles use the nearest-rank method without interpolation: latencies
//! are sorted ascending and the element at `floor(n * q)` is taken. This is
//! deterministic and matches earlier reports bit for bit, but it is a known
//! approximation for small samples. With five samples, for instance, p95 is
//! simply the maximum.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{StatsError, StatsResult};
use crate::model::{HealthSample, LoadResult};
use crate::outcome::{ErrorKind, RequestOutcome};

/// Anything that wraps a single [`RequestOutcome`] and can be aggregated
pub trait Sample {
    fn outcome(&self) -> &RequestOutcome;

    /// Latency the service reported about itself, if any
    fn service_reported_latency_ms(&self) -> Option<f64> {
        None
    }
}

impl Sample for RequestOutcome {
    fn outcome(&self) -> &RequestOutcome {
        self
    }
}

impl Sample for LoadResult {
    fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }

    fn service_reported_latency_ms(&self) -> Option<f64> {
        self.service_reported_latency_ms
    }
}

impl Sample for HealthSample {
    fn outcome(&self) -> &RequestOutcome {
        &self.outcome
    }
}

/// Summary of a set of outcomes. A new run always produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub sample_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate_pct: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Successful requests per second of wall-clock time
    pub throughput_per_sec: f64,
    /// First dispatch to last completion
    pub wall_clock_ms: f64,
    /// Mean of the latencies reported by the service itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_service_reported_ms: Option<f64>,
}

/// Reduce samples into [`AggregateStats`].
///
/// Latency figures are computed over successful samples only. Fails with
/// [`StatsError::InsufficientData`] when there is no successful sample, so an
/// all-failed run is never reported as zero latency.
pub fn aggregate<S: Sample>(samples: &[S], wall_clock: Duration) -> StatsResult<AggregateStats> {
    let sample_count = samples.len();

    let mut latencies: Vec<f64> = samples
        .iter()
        .map(Sample::outcome)
        .filter(|o| o.is_success())
        .map(RequestOutcome::latency_ms)
        .collect();

    let success_count = latencies.len();
    if success_count == 0 {
        return Err(StatsError::InsufficientData {
            samples: sample_count,
            successes: 0,
        });
    }

    // Summing in sorted order keeps the mean independent of input order
    latencies.sort_by(f64::total_cmp);
    let mean_ms = latencies.iter().sum::<f64>() / success_count as f64;

    let mut reported: Vec<f64> = samples
        .iter()
        .filter(|s| s.outcome().is_success())
        .filter_map(Sample::service_reported_latency_ms)
        .collect();
    reported.sort_by(f64::total_cmp);
    let mean_service_reported_ms = if reported.is_empty() {
        None
    } else {
        Some(reported.iter().sum::<f64>() / reported.len() as f64)
    };

    let wall_clock_ms = wall_clock.as_nanos() as f64 / 1_000_000.0;
    let throughput_per_sec = if wall_clock_ms > 0.0 {
        success_count as f64 / (wall_clock_ms / 1000.0)
    } else {
        0.0
    };

    Ok(AggregateStats {
        sample_count,
        success_count,
        failure_count: sample_count - success_count,
        success_rate_pct: 100.0 * success_count as f64 / sample_count as f64,
        mean_ms,
        median_ms: nearest_rank(&latencies, 0.5),
        min_ms: latencies[0],
        max_ms: latencies[success_count - 1],
        p95_ms: nearest_rank(&latencies, 0.95),
        p99_ms: nearest_rank(&latencies, 0.99),
        throughput_per_sec,
        wall_clock_ms,
        mean_service_reported_ms,
    })
}

/// Element at `floor(n * quantile)` of a non-empty ascending slice
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let index = (sorted.len() as f64 * quantile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Failure counts by category and by HTTP status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureBreakdown {
    pub by_kind: BTreeMap<ErrorKind, usize>,
    pub by_status: BTreeMap<u16, usize>,
}

impl FailureBreakdown {
    pub fn from_samples<S: Sample>(samples: &[S]) -> Self {
        let mut breakdown = Self::default();
        for outcome in samples.iter().map(Sample::outcome) {
            if outcome.is_success() {
                continue;
            }
            if let Some(kind) = outcome.error_kind() {
                *breakdown.by_kind.entry(kind).or_insert(0) += 1;
            }
            if let Some(status) = outcome.status_code() {
                *breakdown.by_status.entry(status).or_insert(0) += 1;
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ok(ms: u64) -> RequestOutcome {
        RequestOutcome::succeeded(200, Duration::from_millis(ms), None)
    }

    fn err() -> RequestOutcome {
        RequestOutcome::failed(ErrorKind::Transport, Duration::from_millis(1), "refused")
    }

    #[test]
    fn test_nearest_rank_indices() {
        // 20 samples of 1..=20 ms
        let outcomes: Vec<_> = (1..=20).map(ok).collect();
        let stats = aggregate(&outcomes, Duration::from_secs(2)).unwrap();

        assert_eq!(stats.min_ms, 1.0);
        assert_eq!(stats.max_ms, 20.0);
        assert_eq!(stats.median_ms, 11.0); // index 10
        assert_eq!(stats.p95_ms, 20.0); // index 19
        assert_eq!(stats.p99_ms, 20.0); // index 19
        assert_eq!(stats.mean_ms, 10.5);
        assert_eq!(stats.throughput_per_sec, 10.0);
    }

    #[test]
    fn test_small_sample_p95_is_max() {
        let outcomes: Vec<_> = [30, 10, 50, 20, 40].into_iter().map(ok).collect();
        let stats = aggregate(&outcomes, Duration::from_secs(1)).unwrap();

        assert_eq!(stats.median_ms, 30.0);
        assert_eq!(stats.p95_ms, 50.0);
        assert_eq!(stats.p99_ms, 50.0);
    }

    #[test]
    fn test_failures_excluded_from_latency() {
        let outcomes = vec![ok(10), err(), ok(30), err()];
        let stats = aggregate(&outcomes, Duration::from_secs(1)).unwrap();

        assert_eq!(stats.sample_count, 4);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 2);
        assert_eq!(stats.success_rate_pct, 50.0);
        assert_eq!(stats.min_ms, 10.0);
        assert_eq!(stats.mean_ms, 20.0);
        assert_eq!(stats.throughput_per_sec, 2.0);
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let outcomes: Vec<RequestOutcome> = Vec::new();
        let result = aggregate(&outcomes, Duration::from_secs(1));

        assert_eq!(
            result,
            Err(StatsError::InsufficientData {
                samples: 0,
                successes: 0
            })
        );
        assert!(!result.unwrap_err().all_failed());
    }

    #[test]
    fn test_all_failed_is_insufficient_data() {
        let outcomes = vec![err(), err(), err()];
        let error = aggregate(&outcomes, Duration::from_secs(1)).unwrap_err();

        assert!(error.all_failed());
    }

    #[test]
    fn test_zero_wall_clock_has_zero_throughput() {
        let stats = aggregate(&[ok(5)], Duration::ZERO).unwrap();
        assert_eq!(stats.throughput_per_sec, 0.0);
    }

    #[test]
    fn test_service_reported_latency_mean() {
        let results = vec![
            LoadResult {
                request_index: 0,
                outcome: ok(20),
                service_reported_latency_ms: Some(2.0),
            },
            LoadResult {
                request_index: 1,
                outcome: ok(40),
                service_reported_latency_ms: Some(4.0),
            },
            LoadResult {
                request_index: 2,
                outcome: ok(30),
                service_reported_latency_ms: None,
            },
        ];
        let stats = aggregate(&results, Duration::from_secs(1)).unwrap();

        assert_eq!(stats.mean_service_reported_ms, Some(3.0));
        assert_eq!(stats.mean_ms, 30.0);
    }

    #[test]
    fn test_failure_breakdown() {
        let outcomes = vec![
            ok(1),
            err(),
            RequestOutcome::failed(ErrorKind::Timeout, Duration::from_secs(30), "timed out"),
            RequestOutcome::rejected(503, Duration::from_millis(2), None, "HTTP 503"),
            RequestOutcome::rejected(503, Duration::from_millis(2), None, "HTTP 503"),
        ];
        let breakdown = FailureBreakdown::from_samples(&outcomes);

        assert_eq!(breakdown.total(), 4);
        assert_eq!(breakdown.by_kind[&ErrorKind::UnexpectedStatus], 2);
        assert_eq!(breakdown.by_kind[&ErrorKind::Timeout], 1);
        assert_eq!(breakdown.by_status[&503], 2);
    }

    fn outcomes_strategy() -> impl Strategy<Value = Vec<RequestOutcome>> {
        prop::collection::vec((any::<bool>(), 0u64..5_000_000), 1..200).prop_map(|raw| {
            raw.into_iter()
                .map(|(success, micros)| {
                    let latency = Duration::from_micros(micros);
                    if success {
                        RequestOutcome::succeeded(200, latency, None)
                    } else {
                        RequestOutcome::failed(ErrorKind::Timeout, latency, "timed out")
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(outcomes in outcomes_strategy()) {
            if let Ok(stats) = aggregate(&outcomes, Duration::from_secs(1)) {
                prop_assert!(stats.min_ms <= stats.median_ms);
                prop_assert!(stats.median_ms <= stats.p95_ms);
                prop_assert!(stats.p95_ms <= stats.p99_ms);
                prop_assert!(stats.p99_ms <= stats.max_ms);
            }
        }

        #[test]
        fn prop_success_rate_is_exact(outcomes in outcomes_strategy()) {
            if let Ok(stats) = aggregate(&outcomes, Duration::from_secs(1)) {
                let expected = 100.0 * stats.success_count as f64 / stats.sample_count as f64;
                prop_assert_eq!(stats.success_rate_pct, expected);
                prop_assert_eq!(stats.success_count + stats.failure_count, outcomes.len());
            }
        }

        #[test]
        fn prop_order_invariant(
            (original, shuffled) in outcomes_strategy()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let wall_clock = Duration::from_millis(1500);
            prop_assert_eq!(
                aggregate(&original, wall_clock),
                aggregate(&shuffled, wall_clock)
            );
        }
    }
}
