//! Configuration types for the hostwatch service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_disk")]
    pub disk: MonitoringConfig,
    #[serde(default = "default_cpu")]
    pub cpu: MonitoringConfig,
    #[serde(default = "default_memory")]
    pub memory: MonitoringConfig,
    #[serde(default)]
    pub notifications: Vec<NotifierConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disk: default_disk(),
            cpu: default_cpu(),
            memory: default_memory(),
            notifications: Vec::new(),
        }
    }
}

impl Config {
    /// Monitoring settings for one metric
    pub fn for_metric(&self, metric: crate::sampler::Metric) -> &MonitoringConfig {
        match metric {
            crate::sampler::Metric::Disk => &self.disk,
            crate::sampler::Metric::Cpu => &self.cpu,
            crate::sampler::Metric::Memory => &self.memory,
        }
    }

    /// Check value ranges for every enabled metric
    pub fn validate(&self) -> crate::Result<()> {
        for (name, monitoring) in [
            ("disk", &self.disk),
            ("cpu", &self.cpu),
            ("memory", &self.memory),
        ] {
            if !monitoring.enabled {
                continue;
            }
            if !(1..=100).contains(&monitoring.threshold) {
                return Err(crate::HostwatchError::Config(format!(
                    "{} threshold must be between 1 and 100, got {}",
                    name, monitoring.threshold
                )));
            }
            if monitoring.max_daily_alerts < 1 {
                return Err(crate::HostwatchError::Config(format!(
                    "{} max_daily_alerts must be at least 1, got {}",
                    name, monitoring.max_daily_alerts
                )));
            }
            if monitoring.check_interval_seconds < 1 {
                return Err(crate::HostwatchError::Config(format!(
                    "{} check_interval_seconds must be at least 1, got {}",
                    name, monitoring.check_interval_seconds
                )));
            }
        }
        Ok(())
    }
}

/// Threshold and scheduling settings for one monitored metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Alert when utilization reaches this percentage (1-100)
    pub threshold: u8,
    pub check_interval_seconds: u64,
    #[serde(default = "default_max_daily_alerts")]
    pub max_daily_alerts: u32,
}

/// Notification provider configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    Slack {
        #[serde(default = "default_true")]
        enabled: bool,
        webhook_url: String,
    },
    Telegram {
        #[serde(default = "default_true")]
        enabled: bool,
        bot_token: String,
        chat_id: String,
    },
    Discord {
        #[serde(default = "default_true")]
        enabled: bool,
        webhook_url: String,
    },
}

impl NotifierConfig {
    pub fn kind(&self) -> &str {
        match self {
            NotifierConfig::Slack { .. } => "slack",
            NotifierConfig::Telegram { .. } => "telegram",
            NotifierConfig::Discord { .. } => "discord",
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            NotifierConfig::Slack { enabled, .. }
            | NotifierConfig::Telegram { enabled, .. }
            | NotifierConfig::Discord { enabled, .. } => *enabled,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_daily_alerts() -> u32 {
    5
}

fn default_disk() -> MonitoringConfig {
    MonitoringConfig {
        enabled: true,
        threshold: 80,
        check_interval_seconds: 12 * 60 * 60,
        max_daily_alerts: default_max_daily_alerts(),
    }
}

fn default_cpu() -> MonitoringConfig {
    MonitoringConfig {
        enabled: true,
        threshold: 85,
        check_interval_seconds: 60,
        max_daily_alerts: default_max_daily_alerts(),
    }
}

fn default_memory() -> MonitoringConfig {
    MonitoringConfig {
        enabled: true,
        threshold: 85,
        check_interval_seconds: 60,
        max_daily_alerts: default_max_daily_alerts(),
    }
}

/// Load and validate configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HostwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
