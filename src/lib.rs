//! Hostwatch - host health monitoring and alert notification service
//!
//! Samples disk, CPU, and memory utilization on a schedule and dispatches
//! alerts to configured chat providers when thresholds are exceeded.

pub mod config;
pub mod discord;
pub mod engine;
pub mod error;
pub mod io;
pub mod manager;
pub mod message;
pub mod notifier;
pub mod retry;
pub mod sampler;
pub mod slack;
pub mod state;
pub mod system;
pub mod telegram;

pub use config::{load_config, Config};
pub use error::{HostwatchError, Result};

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::config::NotifierConfig;
use crate::discord::DiscordNotifier;
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::manager::NotificationManager;
use crate::notifier::Notifier;
use crate::sampler::MetricSampler;
use crate::slack::SlackNotifier;
use crate::system::{CpuSampler, DiskSampler, HostIdentity, MemorySampler};
use crate::telegram::TelegramNotifier;

/// Build a notifier from its configuration entry
fn build_notifier(config: &NotifierConfig, http: Arc<dyn HttpClient>) -> Arc<dyn Notifier> {
    match config {
        NotifierConfig::Slack { webhook_url, .. } => {
            Arc::new(SlackNotifier::new(webhook_url.clone(), http))
        }
        NotifierConfig::Telegram {
            bot_token, chat_id, ..
        } => Arc::new(TelegramNotifier::new(bot_token.clone(), chat_id.clone(), http)),
        NotifierConfig::Discord { webhook_url, .. } => {
            Arc::new(DiscordNotifier::new(webhook_url.clone(), http))
        }
    }
}

/// Run the hostwatch service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    let cancel = CancellationToken::new();

    let host = HostIdentity::discover();
    tracing::info!("Monitoring server: {} ({})", host.hostname, host.ip);

    // Register notification providers; an invalid entry is refused and
    // logged but does not take the remaining providers down with it.
    let mut manager = NotificationManager::new(cancel.clone());
    for notifier_config in &config.notifications {
        if !notifier_config.enabled() {
            tracing::debug!("Skipping disabled '{}' notifier", notifier_config.kind());
            continue;
        }
        let notifier = build_notifier(notifier_config, Arc::clone(&http));
        if let Err(e) = manager.add_notifier(notifier) {
            tracing::error!("Refusing notification provider: {}", e);
        }
    }
    tracing::info!("{} notification provider(s) active", manager.notifier_count());

    // Build samplers for the enabled metrics
    let mut samplers: Vec<Arc<dyn MetricSampler>> = Vec::new();
    if config.disk.enabled {
        samplers.push(Arc::new(DiskSampler::new("/")));
    }
    if config.cpu.enabled {
        samplers.push(Arc::new(CpuSampler));
    }
    if config.memory.enabled {
        samplers.push(Arc::new(MemorySampler));
    }

    let quotas = state::new_quota_handle(Local::now().date_naive());

    let engine = Engine::new(
        samplers,
        Arc::new(manager),
        config,
        quotas,
        host,
        cancel.clone(),
    );

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    tracing::info!("Hostwatch engine started");

    // Run the engine (blocks until cancelled)
    engine.run().await;

    tracing::info!("Hostwatch engine stopped");

    Ok(())
}
