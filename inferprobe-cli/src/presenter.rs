//! Console and JSON rendering of run results

use crate::cli::OutputFormat;
use crate::report::RunReport;
use colored::*;
use inferprobe_core::{
    AggregateStats, FailureBreakdown, HealthReport, StageOutcome, StageReport, StressReport,
};
use inferprobe_execution::EndpointCheck;
use inferprobe_http::HealthResponse;
use inferprobe_resilience::ReadinessResult;

/// Prints each phase as it finishes (console) or the whole report at the
/// end (JSON)
pub struct Presenter {
    format: OutputFormat,
}

impl Presenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn console(&self) -> bool {
        self.format == OutputFormat::Console
    }

    pub fn header(&self, title: &str) {
        if !self.console() {
            return;
        }
        let width = title.chars().count() + 4;
        println!();
        println!("{}", format!("╔{}╗", "═".repeat(width)).bright_blue());
        println!(
            "{}  {}  {}",
            "║".bright_blue(),
            title.bold(),
            "║".bright_blue()
        );
        println!("{}", format!("╚{}╝", "═".repeat(width)).bright_blue());
    }

    fn success(&self, message: &str) {
        println!("{} {}", "✓".bright_green().bold(), message);
    }

    fn failure(&self, message: &str) {
        println!("{} {}", "✗".bright_red().bold(), message.bright_red());
    }

    fn warning(&self, message: &str) {
        println!("{} {}", "⚠".bright_yellow().bold(), message.bright_yellow());
    }

    pub fn error(&self, message: &str) {
        if self.console() {
            self.failure(message);
        }
    }

    pub fn readiness(&self, result: &ReadinessResult) {
        if !self.console() {
            return;
        }
        if result.ready {
            self.success(&format!(
                "Service ready after {} attempt(s) in {}",
                result.attempts_used,
                format_ms(result.elapsed.as_millis() as f64)
            ));
        } else {
            let reason = result
                .last_outcome
                .as_ref()
                .and_then(|o| o.error_reason())
                .unwrap_or("no attempt made");
            self.failure(&format!(
                "Service not ready after {} attempt(s): {}",
                result.attempts_used, reason
            ));
        }
    }

    pub fn service_info(&self, health: &HealthResponse) {
        if !self.console() {
            return;
        }
        println!("  {:<16} {}", "Device:".dimmed(), health.device);
        if let Some(version) = &health.version {
            println!("  {:<16} {}", "Version:".dimmed(), version);
        }
        println!("  {:<16} {}", "CUDA:".dimmed(), yes_no(health.cuda_available));
        println!("  {:<16} {}", "ROCm:".dimmed(), yes_no(health.rocm_available));
    }

    pub fn endpoints(&self, checks: &[EndpointCheck]) {
        if !self.console() {
            return;
        }
        for check in checks {
            let line = format!(
                "{:<32} {:<16} {}",
                check.name,
                check.path,
                format_ms(check.latency_ms)
            );
            match &check.reason {
                None => self.success(&line),
                Some(reason) => self.failure(&format!("{} ({})", line, reason)),
            }
        }
        let passed = checks.iter().filter(|c| c.success).count();
        println!("  {}/{} endpoint checks passed", passed, checks.len());
    }

    pub fn monitor(&self, report: &HealthReport) {
        if !self.console() {
            return;
        }
        let summary = &report.summary;
        println!("  {:<16} {}", "Samples:", summary.total_samples);
        println!(
            "  {:<16} {}",
            "Uptime:",
            colored_rate(summary.uptime_pct)
        );
        if let (Some(avg), Some(min), Some(max)) = (
            summary.avg_latency_ms,
            summary.min_latency_ms,
            summary.max_latency_ms,
        ) {
            println!("  {:<16} {}", "Avg latency:", format_ms(avg));
            println!("  {:<16} {}", "Min latency:", format_ms(min));
            println!("  {:<16} {}", "Max latency:", format_ms(max));
        } else {
            self.warning("No healthy samples");
        }
    }

    pub fn stage(&self, report: &StageReport) {
        if !self.console() {
            return;
        }
        match &report.outcome {
            StageOutcome::Completed { stats, failures } => {
                print_stats(stats);
                print_failures(failures);
            }
            StageOutcome::Failed { reason, .. } => {
                self.failure(&format!("{}: {}", report.spec.name, reason));
            }
        }
    }

    pub fn stress(&self, report: &StressReport) {
        if !self.console() {
            return;
        }
        print_table(
            &[
                "Stage",
                "Concurrency",
                "Requests",
                "Success",
                "Mean",
                "P95",
                "Throughput",
            ],
            &stress_rows(report),
        );

        if report.halted {
            self.failure(&format!(
                "Halted: {} of {} stages ran",
                report.stages.len(),
                report.planned_stages
            ));
        }
        if report.interrupted {
            self.warning(&format!(
                "Interrupted: {} of {} stages ran",
                report.stages.len(),
                report.planned_stages
            ));
        }
    }

    /// Final verdict, plus the whole document in JSON mode
    pub fn finish(&self, report: &RunReport) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Console => {
                println!();
                let failures = report.failures();
                if failures.is_empty() {
                    self.success("All checks passed");
                } else {
                    for failure in &failures {
                        self.failure(failure);
                    }
                }
            }
        }
        Ok(())
    }
}

fn print_stats(stats: &AggregateStats) {
    println!(
        "  {:<20} {} ({} ok, {} failed)",
        "Requests:", stats.sample_count, stats.success_count, stats.failure_count
    );
    println!("  {:<20} {}", "Success rate:", colored_rate(stats.success_rate_pct));
    println!("  {:<20} {}", "Mean:", format_ms(stats.mean_ms));
    println!("  {:<20} {}", "Median:", format_ms(stats.median_ms));
    println!("  {:<20} {}", "Min:", format_ms(stats.min_ms));
    println!("  {:<20} {}", "Max:", format_ms(stats.max_ms));
    println!("  {:<20} {}", "P95:", format_ms(stats.p95_ms));
    println!("  {:<20} {}", "P99:", format_ms(stats.p99_ms));
    println!(
        "  {:<20} {:.2} req/s",
        "Throughput:", stats.throughput_per_sec
    );
    if let Some(reported) = stats.mean_service_reported_ms {
        println!("  {:<20} {}", "Service inference:", format_ms(reported));
    }
}

fn print_failures(failures: &FailureBreakdown) {
    if failures.is_empty() {
        return;
    }
    println!("  {}", "Failures:".bright_yellow());
    for (kind, count) in &failures.by_kind {
        println!("    {:<18} {}", kind.as_str(), count);
    }
    for (status, count) in &failures.by_status {
        println!("    {:<18} {}", format!("HTTP {}", status), count);
    }
}

/// Rows of the stress comparison table
pub fn stress_rows(report: &StressReport) -> Vec<Vec<String>> {
    report
        .stages
        .iter()
        .map(|stage| {
            let mut row = vec![
                stage.spec.name.clone(),
                stage.spec.concurrency.to_string(),
                stage.spec.request_count.to_string(),
            ];
            match stage.stats() {
                Some(stats) => row.extend([
                    format!("{:.1}%", stats.success_rate_pct),
                    format_ms(stats.mean_ms),
                    format_ms(stats.p95_ms),
                    format!("{:.2} req/s", stats.throughput_per_sec),
                ]),
                None => row.extend([
                    "FAILED".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]),
            }
            row
        })
        .collect()
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let separator = |left: &str, mid: &str, right: &str| {
        let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        println!("{}{}{}", left, inner.join(mid), right);
    };

    separator("┌", "┬", "┐");
    print!("│");
    for (i, header) in headers.iter().enumerate() {
        print!(" {} │", format!("{:width$}", header, width = widths[i]).bright_cyan().bold());
    }
    println!();
    separator("├", "┼", "┤");
    for row in rows {
        print!("│");
        for (i, cell) in row.iter().enumerate() {
            let padded = format!("{:width$}", cell, width = widths[i]);
            if cell == "FAILED" {
                print!(" {} │", padded.bright_red());
            } else {
                print!(" {} │", padded);
            }
        }
        println!();
    }
    separator("└", "┴", "┘");
}

pub fn format_ms(ms: f64) -> String {
    if ms >= 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{:.1}ms", ms)
    }
}

fn colored_rate(pct: f64) -> ColoredString {
    let text = format!("{:.1}%", pct);
    if pct >= 99.0 {
        text.bright_green()
    } else if pct >= 90.0 {
        text.bright_yellow()
    } else {
        text.bright_red()
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "available"
    } else {
        "not available"
    }
}
