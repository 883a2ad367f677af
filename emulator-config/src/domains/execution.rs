//! Execution engine configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the CPU stressor consumes its budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuStrategyKind {
    /// Spin until the thread CPU clock reaches the budget
    #[default]
    BusyLoop,
    /// Sleep for the budget instead of burning it
    Sleep,
}

impl FromStr for CpuStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "busy_loop" | "busy-loop" | "busyloop" => Ok(CpuStrategyKind::BusyLoop),
            "sleep" => Ok(CpuStrategyKind::Sleep),
            _ => Err(format!("Invalid cpu strategy: {}", s)),
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub cpu_strategy: CpuStrategyKind,

    /// Pin every CPU worker to the core it starts on while it spins
    #[serde(default = "crate::domains::utils::default_true")]
    pub lock_threads: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            cpu_strategy: CpuStrategyKind::BusyLoop,
            lock_threads: true,
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}
