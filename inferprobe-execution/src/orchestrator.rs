//! Escalating stress stages

use crate::load::LoadGenerator;
use inferprobe_core::{StageOutcome, StageReport, StageSpec, StressReport};
use inferprobe_http::HttpRequest;
use inferprobe_resilience::{CircuitBreaker, ShutdownSignal};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Runs stages in order with a cooldown in between.
///
/// A stage without a single successful request opens the circuit breaker
/// and the remaining stages are skipped. A fired shutdown signal is honoured
/// between stages and during the cooldown (and between batches when the
/// generator carries the same signal), never in the middle of a batch.
pub struct StageOrchestrator {
    generator: LoadGenerator,
    shutdown: Option<ShutdownSignal>,
}

impl StageOrchestrator {
    pub fn new(generator: LoadGenerator) -> Self {
        Self {
            generator,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }

    async fn cooldown(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        info!("Cooling down for {:?}", duration);
        match &self.shutdown {
            Some(signal) => {
                tokio::select! {
                    _ = sleep(duration) => {}
                    _ = signal.triggered() => {}
                }
            }
            None => sleep(duration).await,
        }
    }

    pub async fn run_stages<F>(
        &self,
        stages: &[StageSpec],
        cooldown: Duration,
        build_request: F,
    ) -> StressReport
    where
        F: Fn(usize) -> HttpRequest,
    {
        let mut breaker = CircuitBreaker::single_failure();
        let mut reports = Vec::with_capacity(stages.len());
        let mut interrupted = false;

        for (position, spec) in stages.iter().enumerate() {
            if self.shutdown_requested() {
                warn!(
                    "Shutdown requested, skipping {} remaining stage(s)",
                    stages.len() - position
                );
                interrupted = true;
                break;
            }

            info!(
                "Stage {}/{}: {} ({} concurrent, {} requests)",
                position + 1,
                stages.len(),
                spec.name,
                spec.concurrency,
                spec.request_count
            );

            let report = match self
                .generator
                .run(spec.request_count, spec.concurrency, &build_request)
                .await
            {
                Ok(run) => run.into_stage_report(spec),
                Err(e) => StageReport {
                    spec: spec.clone(),
                    outcome: StageOutcome::Failed {
                        requests: 0,
                        failures: 0,
                        reason: e.to_string(),
                    },
                },
            };

            match &report.outcome {
                StageOutcome::Completed { stats, .. } => {
                    info!(
                        "Stage {} done: {:.1}% success, mean {:.1}ms, {:.1} req/s",
                        spec.name, stats.success_rate_pct, stats.mean_ms, stats.throughput_per_sec
                    );
                    breaker.record_success();
                }
                StageOutcome::Failed { reason, .. } => {
                    breaker.record_failure(format!("stage '{}': {}", spec.name, reason));
                }
            }
            reports.push(report);

            if breaker.is_open() {
                warn!(
                    "Halting stress test, {} stage(s) not run",
                    stages.len() - position - 1
                );
                break;
            }

            if position + 1 < stages.len() {
                self.cooldown(cooldown).await;
            }
        }

        StressReport {
            stages: reports,
            halted: breaker.is_open(),
            interrupted,
            planned_stages: stages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok_with_latency, ScriptedExecutor};
    use inferprobe_core::{ErrorKind, RequestOutcome};
    use tokio::time::Instant;

    fn generator(executor: std::sync::Arc<ScriptedExecutor>) -> LoadGenerator {
        LoadGenerator::new(executor, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_stages_with_cooldown() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(5, None));
        let orchestrator = StageOrchestrator::new(generator(executor.clone()));
        let stages = vec![
            StageSpec::new("One", 1, 2),
            StageSpec::new("Two", 2, 4),
            StageSpec::new("Three", 3, 6),
        ];

        let started = Instant::now();
        let report = orchestrator
            .run_stages(&stages, Duration::from_secs(5), |_| HttpRequest::get("http://svc"))
            .await;

        assert_eq!(report.stages.len(), 3);
        assert!(report.is_success());
        assert_eq!(executor.calls(), 12);
        // Two cooldowns, none after the last stage
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stage_halts_sequence() {
        let executor = ScriptedExecutor::new(|_| {
            RequestOutcome::failed(ErrorKind::Transport, Duration::from_millis(1), "connection refused")
        });
        let orchestrator = StageOrchestrator::new(generator(executor.clone()));
        let stages = vec![StageSpec::new("Baseline", 1, 5), StageSpec::new("Light", 5, 25)];

        let report = orchestrator
            .run_stages(&stages, Duration::from_secs(5), |_| HttpRequest::get("http://svc"))
            .await;

        assert_eq!(report.stages.len(), 1);
        assert!(report.halted);
        assert!(report.stages[0].is_failed());
        assert_eq!(report.planned_stages, 2);
        // Stage two never dispatched anything
        assert_eq!(executor.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_failure_keeps_earlier_stages() {
        let executor = ScriptedExecutor::new(|call| {
            if call < 2 {
                ok_with_latency(5, None)
            } else {
                RequestOutcome::rejected(503, Duration::from_millis(1), None, "HTTP 503 (expected 200)")
            }
        });
        let orchestrator = StageOrchestrator::new(generator(executor));
        let stages = vec![
            StageSpec::new("One", 1, 2),
            StageSpec::new("Two", 2, 2),
            StageSpec::new("Three", 2, 2),
        ];

        let report = orchestrator
            .run_stages(&stages, Duration::ZERO, |_| HttpRequest::get("http://svc"))
            .await;

        assert_eq!(report.stages.len(), 2);
        assert!(report.stages[0].stats().is_some());
        assert!(report.stages[1].is_failed());
        assert!(report.halted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_between_stages() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(5, None));
        let shutdown = ShutdownSignal::new();
        let orchestrator =
            StageOrchestrator::new(generator(executor.clone())).with_shutdown(shutdown.clone());
        let stages = vec![StageSpec::new("One", 1, 1), StageSpec::new("Two", 1, 1)];

        let report = {
            let trigger = shutdown.clone();
            let run = orchestrator.run_stages(&stages, Duration::from_secs(60), |_| {
                // Fire as soon as the first request is built
                trigger.trigger();
                HttpRequest::get("http://svc")
            });
            run.await
        };

        assert!(report.interrupted);
        assert!(!report.halted);
        assert_eq!(report.stages.len(), 1);
        assert_eq!(executor.calls(), 1);
        assert!(!report.is_success());
    }
}
