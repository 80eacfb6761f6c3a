//! Sequential single-request benchmark

use crate::error::ExecutionResult;
use crate::load::LoadGenerator;
use inferprobe_core::{StageReport, StageSpec};
use inferprobe_http::HttpRequest;
use tracing::info;

/// Warm-up followed by measured sequential requests. Runs on the load
/// generator with a concurrency of one.
pub struct SingleBenchmark {
    generator: LoadGenerator,
    warmup_runs: usize,
    benchmark_runs: usize,
}

impl SingleBenchmark {
    pub fn new(generator: LoadGenerator, warmup_runs: usize, benchmark_runs: usize) -> Self {
        Self {
            generator,
            warmup_runs,
            benchmark_runs,
        }
    }

    pub fn spec(&self) -> StageSpec {
        StageSpec::new("Single Request", 1, self.benchmark_runs)
    }

    /// Warm-up results are discarded; only the measured runs are reported
    pub async fn run(&self, request: &HttpRequest) -> ExecutionResult<StageReport> {
        if self.warmup_runs > 0 {
            info!("Warming up with {} request(s)", self.warmup_runs);
            let warmup = self
                .generator
                .run(self.warmup_runs, 1, |_| request.clone())
                .await?;
            info!(
                "Warm-up finished: {}/{} succeeded",
                warmup.success_count(),
                warmup.results.len()
            );
        }

        info!("Running {} measured request(s)", self.benchmark_runs);
        let run = self
            .generator
            .run(self.benchmark_runs, 1, |_| request.clone())
            .await?;

        Ok(run.into_stage_report(&self.spec()))
    }
}
