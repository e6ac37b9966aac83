//! Metric sampler trait and metric identifiers

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A monitored utilization metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Disk,
    Cpu,
    Memory,
}

impl Metric {
    /// Lowercase key used in config and log output
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Disk => "disk",
            Metric::Cpu => "cpu",
            Metric::Memory => "memory",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Disk => write!(f, "Disk"),
            Metric::Cpu => write!(f, "CPU"),
            Metric::Memory => write!(f, "Memory"),
        }
    }
}

/// Trait for reading the current utilization of one metric.
///
/// `sample` returns a percentage in `[0, 100]` on success; on platform or
/// permission failure it returns a descriptive error rather than a
/// fabricated value.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MetricSampler: Send + Sync {
    /// Which metric this sampler reads
    fn metric(&self) -> Metric;

    /// Read the current utilization percentage
    async fn sample(&self) -> crate::Result<f64>;
}
