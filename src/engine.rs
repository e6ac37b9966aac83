//! Engine: per-metric evaluation loops, severity classification, daily reset

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, MonitoringConfig};
use crate::manager::NotificationManager;
use crate::message::{format_percent, AlertLevel, AlertMessage};
use crate::sampler::{Metric, MetricSampler};
use crate::state::QuotaHandle;
use crate::system::HostIdentity;

/// Samples at or above this percentage classify as `error` regardless of the
/// configured threshold; everything else over threshold is a `warning`.
pub const SEVERITY_ERROR_CUTOFF: f64 = 95.0;

/// How often the daily quota-reset check runs
const RESET_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// The engine drives one evaluation loop per enabled metric plus the
/// daily-reset loop, all tied to a shared cancellation token.
pub struct Engine {
    samplers: Vec<Arc<dyn MetricSampler>>,
    manager: Arc<NotificationManager>,
    config: Config,
    quotas: QuotaHandle,
    host: HostIdentity,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        samplers: Vec<Arc<dyn MetricSampler>>,
        manager: Arc<NotificationManager>,
        config: Config,
        quotas: QuotaHandle,
        host: HostIdentity,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            samplers,
            manager,
            config,
            quotas,
            host,
            cancel,
        }
    }

    /// Start all loops. Returns when the cancellation token is triggered.
    pub async fn run(&self) {
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        for sampler in &self.samplers {
            let metric = sampler.metric();
            let monitoring = self.config.for_metric(metric).clone();
            let sampler = Arc::clone(sampler);
            let manager = Arc::clone(&self.manager);
            let quotas = Arc::clone(&self.quotas);
            let host = self.host.clone();
            let cancel = self.cancel.clone();

            handles.push(tokio::spawn(async move {
                check_loop(sampler, monitoring, manager, quotas, host, cancel).await;
            }));
        }

        let quotas = Arc::clone(&self.quotas);
        let cancel = self.cancel.clone();
        handles.push(tokio::spawn(async move {
            reset_loop(quotas, cancel).await;
        }));

        self.cancel.cancelled().await;

        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn check_loop(
    sampler: Arc<dyn MetricSampler>,
    monitoring: MonitoringConfig,
    manager: Arc<NotificationManager>,
    quotas: QuotaHandle,
    host: HostIdentity,
    cancel: CancellationToken,
) {
    let interval = Duration::from_secs(monitoring.check_interval_seconds);
    loop {
        let _ = check_metric(sampler.as_ref(), &monitoring, &manager, &quotas, &host).await;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Check loop for '{}' cancelled", sampler.metric().key());
                break;
            }
        }
    }
}

/// Hourly check that zeroes the daily alert counters once the local
/// calendar date changes.
async fn reset_loop(quotas: QuotaHandle, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(RESET_CHECK_INTERVAL) => {}
            _ = cancel.cancelled() => return,
        }

        let today = Local::now().date_naive();
        if quotas.write().await.reset_if_new_day(today) {
            tracing::info!("Notification counts reset");
        }
    }
}

/// One evaluation cycle for one metric.
///
/// Order matters: the daily quota is checked before sampling, a sampling
/// failure skips the cycle without consuming quota, and the sent count
/// increments as soon as the alert is dispatched, independent of delivery
/// outcome. Returns the delivery handles spawned for a fired alert (empty
/// when nothing fired).
pub async fn check_metric(
    sampler: &dyn MetricSampler,
    monitoring: &MonitoringConfig,
    manager: &NotificationManager,
    quotas: &QuotaHandle,
    host: &HostIdentity,
) -> Vec<JoinHandle<()>> {
    let metric = sampler.metric();

    if quotas.read().await.sent_today(metric) >= monitoring.max_daily_alerts {
        tracing::debug!(
            "Daily alert limit reached for '{}', suppressing check",
            metric.key()
        );
        return Vec::new();
    }

    let usage = match sampler.sample().await {
        Ok(usage) => usage,
        Err(e) => {
            tracing::warn!("Error checking {} usage: {}", metric.key(), e);
            return Vec::new();
        }
    };

    if usage < f64::from(monitoring.threshold) {
        return Vec::new();
    }

    let message = build_alert(metric, usage, monitoring.threshold, host);
    tracing::info!(
        "{} usage {} exceeds threshold {}%, dispatching {} alert",
        metric,
        format_percent(usage),
        monitoring.threshold,
        message.level
    );

    let handles = manager.send(message);
    quotas.write().await.record_sent(metric);
    handles
}

/// Severity for a breaching sample
pub fn classify(usage: f64) -> AlertLevel {
    if usage >= SEVERITY_ERROR_CUTOFF {
        AlertLevel::Error
    } else {
        AlertLevel::Warning
    }
}

/// Build the provider-agnostic alert for a threshold breach
pub fn build_alert(metric: Metric, usage: f64, threshold: u8, host: &HostIdentity) -> AlertMessage {
    let value = format_percent(usage);
    AlertMessage {
        level: classify(usage),
        title: format!("{} Usage Alert", metric),
        body: format!(
            "{} usage is {}, exceeding the configured threshold of {}%.",
            metric, value, threshold
        ),
        hostname: host.hostname.clone(),
        ip: host.ip.clone(),
        timestamp: Local::now(),
        metric: Some(metric.key().to_string()),
        value: Some(value),
        threshold: Some(format!("{}%", threshold)),
    }
}
