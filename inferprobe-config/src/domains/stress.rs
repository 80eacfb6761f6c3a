//! Stress test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use inferprobe_core::StageSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Escalating stages and the pause between them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Stages in execution order
    #[serde(default = "StageSpec::default_sequence")]
    pub stages: Vec<StageSpec>,

    /// Pause between two stages
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_cooldown"
    )]
    pub cooldown: Duration,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            stages: StageSpec::default_sequence(),
            cooldown: default_cooldown(),
        }
    }
}

impl Validatable for StressConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(self.validation_error("at least one stage is required"));
        }

        for (index, stage) in self.stages.iter().enumerate() {
            validate_required_string(&stage.name, &format!("stages[{}].name", index), self.domain_name())?;
            validate_positive(
                stage.concurrency,
                &format!("stages[{}].concurrency", index),
                self.domain_name(),
            )?;
            validate_positive(
                stage.request_count,
                &format!("stages[{}].request_count", index),
                self.domain_name(),
            )?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "stress"
    }
}

fn default_cooldown() -> Duration {
    Duration::from_secs(5)
}
