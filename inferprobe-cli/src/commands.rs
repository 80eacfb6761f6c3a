//! One function per verification mode

use crate::cli::Commands;
use crate::presenter::Presenter;
use crate::report::RunReport;
use inferprobe_config::InferProbeConfig;
use inferprobe_core::StageSpec;
use inferprobe_execution::{
    EndpointChecker, HealthMonitor, LoadGenerator, PredictionTarget, SingleBenchmark,
    StageOrchestrator,
};
use inferprobe_http::{HealthResponse, HttpRequest, RequestExecutor};
use inferprobe_resilience::{ReadinessPolicy, ReadinessProber, ShutdownSignal};
use std::sync::Arc;
use tracing::{info, warn};

const LOAD_STAGE_NAME: &str = "Load Test";

/// Shared state of one invocation
pub struct Context {
    pub config: InferProbeConfig,
    pub executor: Arc<dyn RequestExecutor>,
    pub shutdown: ShutdownSignal,
    pub presenter: Presenter,
}

impl Context {
    fn generator(&self) -> LoadGenerator {
        LoadGenerator::new(Arc::clone(&self.executor), self.config.target.request_timeout)
            .with_reported_latency_field(self.config.load.reported_latency_field.clone())
            .with_shutdown(self.shutdown.clone())
    }

    async fn prediction_target(&self, report: &mut RunReport) -> Option<PredictionTarget> {
        match PredictionTarget::load(&self.config.target, &self.config.load).await {
            Ok(target) => Some(target),
            Err(e) => {
                self.presenter.error(&e.to_string());
                report.errors.push(e.to_string());
                None
            }
        }
    }
}

/// Run `command` and collect everything it produced
pub async fn run(command: &Commands, ctx: &Context) -> RunReport {
    let mut report = RunReport::default();

    match command {
        Commands::Ready => {
            ready(ctx, &mut report).await;
        }
        Commands::Monitor { .. } => monitor(ctx, &mut report).await,
        Commands::Single => {
            if let Some(target) = ctx.prediction_target(&mut report).await {
                single(ctx, &target, &mut report).await;
            }
        }
        Commands::Load { .. } => {
            if let Some(target) = ctx.prediction_target(&mut report).await {
                load(ctx, &target, &mut report).await;
            }
        }
        Commands::Stress { .. } => {
            if let Some(target) = ctx.prediction_target(&mut report).await {
                stress(ctx, &target, &mut report).await;
            }
        }
        Commands::All => all(ctx, &mut report).await,
        Commands::SampleConfig => {}
    }

    report.interrupted = ctx.shutdown.is_triggered();
    report
}

/// Returns whether the service became ready
async fn ready(ctx: &Context, report: &mut RunReport) -> bool {
    ctx.presenter.header("Readiness");
    let request = HttpRequest::get(ctx.config.target.endpoint(&ctx.config.readiness.health_path));
    let prober = ReadinessProber::new(
        Arc::clone(&ctx.executor),
        ReadinessPolicy::from(&ctx.config.readiness),
    )
    .with_shutdown(ctx.shutdown.clone());

    let result = prober.wait_until_ready(&request).await;
    ctx.presenter.readiness(&result);

    if result.ready {
        if let Some(outcome) = &result.last_outcome {
            match HealthResponse::from_outcome(outcome) {
                Ok(health) => {
                    ctx.presenter.service_info(&health);
                    report.service = Some(health);
                }
                Err(e) => warn!("Health response not understood: {}", e),
            }
        }
    }

    let ready = result.ready;
    report.readiness = Some(result);
    ready
}

async fn monitor(ctx: &Context, report: &mut RunReport) {
    let config = &ctx.config.monitor;
    ctx.presenter.header("Health Monitoring");

    let request = HttpRequest::get(ctx.config.target.endpoint(&config.health_path)).expect_status(200);
    let health = HealthMonitor::from_config(Arc::clone(&ctx.executor), config)
        .with_shutdown(ctx.shutdown.clone())
        .monitor(&request, config.duration, config.interval)
        .await;

    ctx.presenter.monitor(&health);
    report.monitor = Some(health);
}

async fn endpoints(ctx: &Context, target: Option<&PredictionTarget>, report: &mut RunReport) {
    ctx.presenter.header("Endpoint Checks");
    let checker = EndpointChecker::new(Arc::clone(&ctx.executor), ctx.config.target.clone());
    let checks = checker.check_all(target).await;
    ctx.presenter.endpoints(&checks);
    report.endpoints = checks;
}

async fn single(ctx: &Context, target: &PredictionTarget, report: &mut RunReport) {
    let config = &ctx.config.load;
    let benchmark = SingleBenchmark::new(ctx.generator(), config.warmup_runs, config.benchmark_runs);
    ctx.presenter.header(&benchmark.spec().name);

    match benchmark.run(&target.predict_request()).await {
        Ok(stage) => {
            ctx.presenter.stage(&stage);
            report.single = Some(stage);
        }
        Err(e) => {
            ctx.presenter.error(&e.to_string());
            report.errors.push(e.to_string());
        }
    }
}

async fn load(ctx: &Context, target: &PredictionTarget, report: &mut RunReport) {
    let config = &ctx.config.load;
    let spec = StageSpec::new(
        LOAD_STAGE_NAME,
        config.concurrent_requests,
        config.total_requests,
    );
    ctx.presenter.header(&format!(
        "{} ({} concurrent, {} requests)",
        spec.name, spec.concurrency, spec.request_count
    ));

    let request = target.predict_request();
    match ctx
        .generator()
        .run(spec.request_count, spec.concurrency, |_| request.clone())
        .await
    {
        Ok(run) => {
            let stage = run.into_stage_report(&spec);
            ctx.presenter.stage(&stage);
            report.load = Some(stage);
        }
        Err(e) => {
            ctx.presenter.error(&e.to_string());
            report.errors.push(e.to_string());
        }
    }
}

async fn stress(ctx: &Context, target: &PredictionTarget, report: &mut RunReport) {
    let config = &ctx.config.stress;
    ctx.presenter.header("Stress Test");

    let request = target.predict_request();
    let stress = StageOrchestrator::new(ctx.generator())
        .with_shutdown(ctx.shutdown.clone())
        .run_stages(&config.stages, config.cooldown, |_| request.clone())
        .await;

    ctx.presenter.stress(&stress);
    report.stress = Some(stress);
}

/// Readiness, endpoint checks, health monitoring, then both benchmarks.
/// Nothing else runs against a service that never became ready, and an
/// interrupt skips every phase that has not started yet.
async fn all(ctx: &Context, report: &mut RunReport) {
    if !ready(ctx, report).await {
        return;
    }

    let target = ctx.prediction_target(report).await;
    endpoints(ctx, target.as_ref(), report).await;

    if interrupted(ctx) {
        return;
    }
    monitor(ctx, report).await;

    if let Some(target) = &target {
        if interrupted(ctx) {
            return;
        }
        single(ctx, target, report).await;
        if interrupted(ctx) {
            return;
        }
        load(ctx, target, report).await;
    }
}

fn interrupted(ctx: &Context) -> bool {
    let fired = ctx.shutdown.is_triggered();
    if fired {
        info!("Shutdown requested, skipping remaining phases");
    }
    fired
}
