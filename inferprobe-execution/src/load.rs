//! Batched load generation

use crate::error::{ExecutionError, ExecutionResult};
use futures::future::join_all;
use inferprobe_core::{
    aggregate, AggregateStats, ErrorKind, FailureBreakdown, LoadResult, RequestOutcome,
    StageOutcome, StageReport, StageSpec, StatsError, StatsResult,
};
use inferprobe_http::api::numeric_field;
use inferprobe_http::{HttpRequest, RequestExecutor};
use inferprobe_resilience::ShutdownSignal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Field of a prediction response that carries the service's own timing
pub const DEFAULT_REPORTED_LATENCY_FIELD: &str = "inference_time_ms";

/// Everything one load run produced
#[derive(Debug, Clone, Serialize)]
pub struct LoadRun {
    /// One entry per request, ordered by request index
    pub results: Vec<LoadResult>,
    /// Size of each batch in dispatch order
    pub batch_sizes: Vec<usize>,
    /// First dispatch to last completion
    #[serde(serialize_with = "serialize_millis")]
    pub wall_clock: Duration,
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
}

impl LoadRun {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            batch_sizes: Vec::new(),
            wall_clock: Duration::ZERO,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failures(&self) -> FailureBreakdown {
        FailureBreakdown::from_samples(&self.results)
    }

    /// Summarise this run as the outcome of `spec`
    pub fn into_stage_report(self, spec: &StageSpec) -> StageReport {
        let outcome = match aggregate_load(&self) {
            Ok(stats) => StageOutcome::Completed {
                stats,
                failures: self.failures(),
            },
            Err(error) => StageOutcome::Failed {
                requests: self.results.len(),
                failures: self.results.len() - self.success_count(),
                reason: describe_insufficient(&error, &self),
            },
        };

        StageReport {
            spec: spec.clone(),
            outcome,
        }
    }
}

fn describe_insufficient(error: &StatsError, run: &LoadRun) -> String {
    if !error.all_failed() {
        return "no requests were issued".to_string();
    }

    // Most common failure reason gives the reader somewhere to start
    let mut reasons: Vec<(&str, usize)> = Vec::new();
    for reason in run.results.iter().filter_map(|r| r.outcome.error_reason()) {
        match reasons.iter_mut().find(|(r, _)| *r == reason) {
            Some((_, count)) => *count += 1,
            None => reasons.push((reason, 1)),
        }
    }
    match reasons.iter().max_by_key(|(_, count)| *count) {
        Some((reason, _)) => format!("all {} requests failed ({})", run.results.len(), reason),
        None => format!("all {} requests failed", run.results.len()),
    }
}

/// Aggregate a run, including the mean of service-reported latencies
pub fn aggregate_load(run: &LoadRun) -> StatsResult<AggregateStats> {
    aggregate(&run.results, run.wall_clock)
}

/// Split `total` requests into sequential batches of at most `concurrency`
pub fn batch_sizes(total: usize, concurrency: usize) -> Vec<usize> {
    if concurrency == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(concurrency)
        .map(|start| concurrency.min(total - start))
        .collect()
}

/// Issues requests in fixed-size concurrent batches.
///
/// Every request of a batch runs as its own tokio task and the generator
/// waits for the whole batch before dispatching the next, so no more than
/// `concurrency` requests are ever in flight. A failing or panicking request
/// is recorded and never affects its siblings.
#[derive(Clone)]
pub struct LoadGenerator {
    executor: Arc<dyn RequestExecutor>,
    request_timeout: Duration,
    reported_latency_field: String,
    shutdown: Option<ShutdownSignal>,
}

impl LoadGenerator {
    pub fn new(executor: Arc<dyn RequestExecutor>, request_timeout: Duration) -> Self {
        Self {
            executor,
            request_timeout,
            reported_latency_field: DEFAULT_REPORTED_LATENCY_FIELD.to_string(),
            shutdown: None,
        }
    }

    /// Read service-reported latency from a different payload field
    pub fn with_reported_latency_field(mut self, field: impl Into<String>) -> Self {
        self.reported_latency_field = field.into();
        self
    }

    /// Stop dispatching new batches once `shutdown` fires. A batch already
    /// in flight always completes.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }

    /// Issue `total_requests` requests built by `build_request(index)`
    pub async fn run<F>(
        &self,
        total_requests: usize,
        max_concurrency: usize,
        build_request: F,
    ) -> ExecutionResult<LoadRun>
    where
        F: Fn(usize) -> HttpRequest,
    {
        if max_concurrency == 0 {
            return Err(ExecutionError::InvalidConcurrency);
        }
        if total_requests == 0 {
            return Ok(LoadRun::empty());
        }

        let sizes = batch_sizes(total_requests, max_concurrency);
        info!(
            "Dispatching {} requests in {} batch(es) of up to {}",
            total_requests,
            sizes.len(),
            max_concurrency
        );

        let started = Instant::now();
        let mut results = Vec::with_capacity(total_requests);
        let mut next_index = 0;

        let mut dispatched = Vec::with_capacity(sizes.len());

        for (batch_number, &size) in sizes.iter().enumerate() {
            if self.shutdown_requested() {
                warn!(
                    "Shutdown requested, {} of {} requests issued",
                    next_index, total_requests
                );
                break;
            }
            dispatched.push(size);

            let handles: Vec<_> = (next_index..next_index + size)
                .map(|index| {
                    let executor = Arc::clone(&self.executor);
                    let request = build_request(index);
                    let timeout = self.request_timeout;
                    tokio::spawn(async move { executor.execute(&request, timeout).await })
                })
                .collect();

            for (offset, joined) in join_all(handles).await.into_iter().enumerate() {
                let outcome = joined.unwrap_or_else(|e| {
                    RequestOutcome::failed(
                        ErrorKind::Transport,
                        Duration::ZERO,
                        format!("request task aborted: {}", e),
                    )
                });
                results.push(self.record(next_index + offset, outcome));
            }

            next_index += size;
            debug!(
                "Batch {}/{} done ({} of {} requests)",
                batch_number + 1,
                sizes.len(),
                next_index,
                total_requests
            );
        }

        Ok(LoadRun {
            results,
            batch_sizes: dispatched,
            wall_clock: started.elapsed(),
        })
    }

    fn record(&self, request_index: usize, outcome: RequestOutcome) -> LoadResult {
        let service_reported_latency_ms = if outcome.is_success() {
            outcome
                .payload()
                .and_then(|payload| numeric_field(payload, &self.reported_latency_field))
        } else {
            None
        };

        LoadResult {
            request_index,
            outcome,
            service_reported_latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok_with_latency, ScriptedExecutor};
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_batch_sizes() {
        assert_eq!(batch_sizes(10, 3), vec![3, 3, 3, 1]);
        assert_eq!(batch_sizes(9, 3), vec![3, 3, 3]);
        assert_eq!(batch_sizes(2, 5), vec![2]);
        assert!(batch_sizes(0, 5).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ten_requests_three_wide() {
        let executor = ScriptedExecutor::delayed(Duration::from_millis(20), |_| {
            ok_with_latency(20, None)
        });
        let generator = LoadGenerator::new(executor.clone(), Duration::from_secs(1));

        let run = generator
            .run(10, 3, |_| HttpRequest::get("http://svc/predict"))
            .await
            .unwrap();

        assert_eq!(run.batch_sizes, vec![3, 3, 3, 1]);
        assert_eq!(run.results.len(), 10);
        let indices: Vec<usize> = run.results.iter().map(|r| r.request_index).collect();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
        assert_eq!(executor.max_in_flight(), 3);
        assert_eq!(executor.calls(), 10);
    }

    #[tokio::test]
    async fn test_every_index_issued_once() {
        let executor = ScriptedExecutor::new(|call| ok_with_latency(1, Some(json!({"n": call}))));
        let generator = LoadGenerator::new(executor.clone(), Duration::from_secs(1));

        let run = generator
            .run(25, 7, |index| HttpRequest::get(format!("http://svc/predict?i={}", index)))
            .await
            .unwrap();

        let seen: HashSet<String> = executor.urls().into_iter().collect();
        assert_eq!(seen.len(), 25);
        assert!(seen.contains("http://svc/predict?i=24"));
        assert_eq!(run.batch_sizes, vec![7, 7, 7, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_between_batches() {
        let executor = ScriptedExecutor::delayed(Duration::from_secs(1), |_| ok_with_latency(5, None));
        let shutdown = ShutdownSignal::new();
        let generator = LoadGenerator::new(executor.clone(), Duration::from_secs(5))
            .with_shutdown(shutdown.clone());

        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            shutdown.trigger();
        });
        let run = generator
            .run(10, 3, |_| HttpRequest::get("http://svc/predict"))
            .await
            .unwrap();
        trigger.await.unwrap();

        // The second batch was in flight when the signal fired and still completed
        assert_eq!(run.batch_sizes, vec![3, 3]);
        assert_eq!(run.results.len(), 6);
        assert_eq!(executor.calls(), 6);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(1, None));
        let generator = LoadGenerator::new(executor.clone(), Duration::from_secs(1));

        let result = generator.run(5, 0, |_| HttpRequest::get("http://svc")).await;

        assert!(matches!(result, Err(ExecutionError::InvalidConcurrency)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_total_is_empty_run() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(1, None));
        let generator = LoadGenerator::new(executor.clone(), Duration::from_secs(1));

        let run = generator.run(0, 4, |_| HttpRequest::get("http://svc")).await.unwrap();

        assert!(run.results.is_empty());
        assert!(run.batch_sizes.is_empty());
        assert!(matches!(
            aggregate_load(&run),
            Err(StatsError::InsufficientData { samples: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_panicking_request_is_isolated() {
        let executor = ScriptedExecutor::new(|call| {
            if call == 2 {
                panic!("executor blew up");
            }
            ok_with_latency(5, None)
        });
        let generator = LoadGenerator::new(executor, Duration::from_secs(1));

        let run = generator.run(6, 3, |_| HttpRequest::get("http://svc")).await.unwrap();

        assert_eq!(run.results.len(), 6);
        assert_eq!(run.success_count(), 5);
        let failed: Vec<_> = run
            .results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0]
            .outcome
            .error_reason()
            .unwrap()
            .starts_with("request task aborted"));
    }

    #[tokio::test]
    async fn test_service_reported_latency_is_extracted() {
        let executor = ScriptedExecutor::new(|call| {
            ok_with_latency(10, Some(json!({"inference_time_ms": (call + 1) as f64})))
        });
        let generator = LoadGenerator::new(executor, Duration::from_secs(1));

        let run = generator.run(3, 1, |_| HttpRequest::get("http://svc")).await.unwrap();
        let reported: Vec<f64> = run
            .results
            .iter()
            .filter_map(|r| r.service_reported_latency_ms)
            .collect();
        assert_eq!(reported.len(), 3);

        let stats = aggregate_load(&run).unwrap();
        assert_eq!(stats.mean_service_reported_ms, Some(2.0));
        assert_eq!(stats.mean_ms, 10.0);
    }

    #[tokio::test]
    async fn test_all_failed_run_becomes_failed_stage() {
        let executor = ScriptedExecutor::new(|_| {
            RequestOutcome::failed(ErrorKind::Transport, Duration::from_millis(1), "connection refused")
        });
        let generator = LoadGenerator::new(executor, Duration::from_secs(1));
        let spec = StageSpec::new("Baseline", 1, 4);

        let run = generator.run(4, 1, |_| HttpRequest::get("http://svc")).await.unwrap();
        let report = run.into_stage_report(&spec);

        assert!(report.is_failed());
        match report.outcome {
            StageOutcome::Failed {
                requests,
                failures,
                reason,
            } => {
                assert_eq!(requests, 4);
                assert_eq!(failures, 4);
                assert_eq!(reason, "all 4 requests failed (connection refused)");
            }
            StageOutcome::Completed { .. } => unreachable!(),
        }
    }
}
