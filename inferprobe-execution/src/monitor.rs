//! Continuous health sampling

use chrono::Utc;
use inferprobe_config::MonitorConfig;
use inferprobe_core::{HealthReport, HealthSample};
use inferprobe_http::{HttpRequest, RequestExecutor};
use inferprobe_resilience::ShutdownSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Samples a health endpoint for a fixed wall-clock duration
pub struct HealthMonitor {
    executor: Arc<dyn RequestExecutor>,
    sample_timeout: Duration,
    shutdown: Option<ShutdownSignal>,
}

impl HealthMonitor {
    pub fn new(executor: Arc<dyn RequestExecutor>, sample_timeout: Duration) -> Self {
        Self {
            executor,
            sample_timeout,
            shutdown: None,
        }
    }

    /// End the session early, keeping the samples taken so far
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_triggered)
    }

    async fn pause(&self, interval: Duration) {
        match &self.shutdown {
            Some(signal) => {
                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = signal.triggered() => {}
                }
            }
            None => sleep(interval).await,
        }
    }

    pub fn from_config(executor: Arc<dyn RequestExecutor>, config: &MonitorConfig) -> Self {
        Self::new(executor, config.sample_timeout)
    }

    /// Take samples until `duration` has elapsed, pausing `interval` after
    /// each one. Elapsed time is only checked before a sample, so the run
    /// can overshoot by one request plus one interval. Failures never end
    /// the session early.
    pub async fn monitor(
        &self,
        request: &HttpRequest,
        duration: Duration,
        interval: Duration,
    ) -> HealthReport {
        info!(
            "Monitoring {} for {:?} every {:?}",
            request.url, duration, interval
        );

        let started = Instant::now();
        let mut samples = Vec::new();

        while started.elapsed() < duration {
            if self.shutdown_requested() {
                info!("Monitoring interrupted after {} sample(s)", samples.len());
                break;
            }
            let outcome = self.executor.execute(request, self.sample_timeout).await;
            debug!(
                "Health sample {}: {} ({:.1}ms)",
                samples.len() + 1,
                if outcome.has_status(200) { "healthy" } else { "unhealthy" },
                outcome.latency_ms()
            );
            samples.push(HealthSample {
                timestamp: Utc::now(),
                outcome,
            });

            self.pause(interval).await;
        }

        let report = HealthReport::new(samples);
        info!(
            "Monitoring finished: {}/{} healthy ({:.1}% uptime)",
            report.summary.healthy_samples, report.summary.total_samples, report.summary.uptime_pct
        );
        report
    }
}

/// Monitor `endpoint`; a sample is healthy when it answers HTTP 200
pub async fn monitor(
    executor: Arc<dyn RequestExecutor>,
    endpoint: &str,
    duration: Duration,
    sample_interval: Duration,
    sample_timeout: Duration,
) -> HealthReport {
    let request = HttpRequest::get(endpoint).expect_status(200);
    HealthMonitor::new(executor, sample_timeout)
        .monitor(&request, duration, sample_interval)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok_with_latency, ScriptedExecutor};
    use inferprobe_core::{ErrorKind, RequestOutcome};

    #[tokio::test(start_paused = true)]
    async fn test_samples_at_fixed_interval() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(3, None));

        let report = monitor(
            executor.clone(),
            "http://svc/health",
            Duration::from_secs(30),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .await;

        // Samples at 0, 5, 10, 15, 20 and 25 seconds
        assert_eq!(report.samples.len(), 6);
        assert_eq!(executor.calls(), 6);
        assert_eq!(report.summary.uptime_pct, 100.0);
        assert_eq!(report.summary.avg_latency_ms, Some(3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_monitoring() {
        let executor = ScriptedExecutor::new(|call| {
            if call % 2 == 0 {
                ok_with_latency(4, None)
            } else {
                RequestOutcome::failed(ErrorKind::Timeout, Duration::from_secs(5), "timed out")
            }
        });

        let report = monitor(
            executor,
            "http://svc/health",
            Duration::from_secs(20),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(report.summary.total_samples, 4);
        assert_eq!(report.summary.healthy_samples, 2);
        assert_eq!(report.summary.uptime_pct, 50.0);
        assert_eq!(report.summary.max_latency_ms, Some(4.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_session_promptly() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(2, None));
        let shutdown = ShutdownSignal::new();
        let monitor = HealthMonitor::new(executor.clone(), Duration::from_secs(5))
            .with_shutdown(shutdown.clone());

        let trigger = tokio::spawn(async move {
            sleep(Duration::from_secs(7)).await;
            shutdown.trigger();
        });
        let started = Instant::now();
        let report = monitor
            .monitor(
                &HttpRequest::get("http://svc/health"),
                Duration::from_secs(30),
                Duration::from_secs(5),
            )
            .await;
        trigger.await.unwrap();

        // Samples at 0 and 5 seconds, then the pause is cut short at 7
        assert_eq!(report.samples.len(), 2);
        assert_eq!(executor.calls(), 2);
        assert!(started.elapsed() < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_takes_no_samples() {
        let executor = ScriptedExecutor::new(|_| ok_with_latency(1, None));

        let report = monitor(
            executor.clone(),
            "http://svc/health",
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;

        assert!(report.samples.is_empty());
        assert_eq!(report.summary.uptime_pct, 0.0);
        assert_eq!(executor.calls(), 0);
    }
}
