//! Provider-agnostic alert message types

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Error => write!(f, "error"),
        }
    }
}

/// An alert to be delivered to all registered notifiers.
///
/// Immutable once constructed; each notifier formats it into its own wire
/// payload without mutating it.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: AlertLevel,
    pub title: String,
    pub body: String,
    pub hostname: String,
    pub ip: String,
    pub timestamp: DateTime<Local>,
    pub metric: Option<String>,
    pub value: Option<String>,
    pub threshold: Option<String>,
}

impl AlertMessage {
    /// Timestamp in the human-readable form the chat providers display
    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Markdown metric suffix shared by the plain-text providers,
    /// e.g. "\n*Metric:* disk = 85% (threshold: 80%)".
    /// Empty when the message carries no metric reading.
    pub fn metric_markdown(&self) -> String {
        let (Some(metric), Some(value)) = (&self.metric, &self.value) else {
            return String::new();
        };
        let mut line = format!("\n*Metric:* {} = {}", metric, value);
        if let Some(threshold) = &self.threshold {
            line.push_str(&format!(" (threshold: {})", threshold));
        }
        line
    }
}

/// Format a utilization percentage for display: whole numbers lose the
/// fractional part ("85%"), everything else keeps one decimal ("85.3%").
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}
