//! Discord webhook notifier using rich embeds

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::message::{AlertLevel, AlertMessage};
use crate::notifier::Notifier;
use crate::retry::post_with_retry;
use crate::slack::validate_webhook_url;

const DISCORD_WEBHOOK_HOSTS: &[&str] = &["discord.com", "discordapp.com"];

const COLOR_INFO: u32 = 0x00ff00;
const COLOR_WARNING: u32 = 0xffff00;
const COLOR_ERROR: u32 = 0xff0000;

/// Sends alerts to a Discord webhook as a single embed
pub struct DiscordNotifier {
    webhook_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier").finish()
    }
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self { webhook_url, http }
    }

    fn build_payload(message: &AlertMessage) -> serde_json::Value {
        let color = match message.level {
            AlertLevel::Info => COLOR_INFO,
            AlertLevel::Warning => COLOR_WARNING,
            AlertLevel::Error => COLOR_ERROR,
        };

        let mut fields = vec![
            serde_json::json!({
                "name": "Server",
                "value": format!("{} ({})", message.hostname, message.ip),
                "inline": true,
            }),
            serde_json::json!({
                "name": "Time",
                "value": message.formatted_time(),
                "inline": true,
            }),
        ];

        if let (Some(_), Some(value)) = (&message.metric, &message.value) {
            let mut field_value = value.clone();
            if let Some(threshold) = &message.threshold {
                field_value.push_str(&format!(" (threshold: {})", threshold));
            }
            fields.push(serde_json::json!({
                "name": "Metric",
                "value": field_value,
                "inline": true,
            }));
        }

        serde_json::json!({
            "embeds": [{
                "title": message.title,
                "description": message.body,
                "color": color,
                "fields": fields,
                "timestamp": message.timestamp.to_rfc3339(),
            }],
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn kind(&self) -> &str {
        "discord"
    }

    fn validate(&self) -> crate::Result<()> {
        validate_webhook_url(&self.webhook_url, DISCORD_WEBHOOK_HOSTS)
    }

    async fn send(&self, cancel: &CancellationToken, message: &AlertMessage) -> crate::Result<()> {
        let payload = Self::build_payload(message);
        post_with_retry(self.http.as_ref(), cancel, &self.webhook_url, &payload).await
    }
}
