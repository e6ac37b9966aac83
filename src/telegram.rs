//! Telegram bot-API notifier

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::message::{AlertLevel, AlertMessage};
use crate::notifier::Notifier;
use crate::retry::post_with_retry;

/// Sends alerts through the Telegram bot API as markdown messages
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, http: Arc<dyn HttpClient>) -> Self {
        Self {
            bot_token,
            chat_id,
            http,
        }
    }

    fn api_url(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token)
    }

    fn format_text(message: &AlertMessage) -> String {
        let emoji = match message.level {
            AlertLevel::Info => "\u{2139}\u{fe0f}",
            AlertLevel::Warning => "\u{26a0}\u{fe0f}",
            AlertLevel::Error => "\u{274c}",
        };

        let mut text = format!(
            "{} *{}*\n\n{}\n\n*Server:* {} ({})\n*Time:* {}",
            emoji,
            message.title,
            message.body,
            message.hostname,
            message.ip,
            message.formatted_time()
        );
        text.push_str(&message.metric_markdown());
        text
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn kind(&self) -> &str {
        "telegram"
    }

    fn validate(&self) -> crate::Result<()> {
        if self.bot_token.is_empty() {
            return Err(crate::HostwatchError::Config(
                "bot token is required".to_string(),
            ));
        }
        if self.chat_id.is_empty() {
            return Err(crate::HostwatchError::Config(
                "chat ID is required".to_string(),
            ));
        }
        Ok(())
    }

    async fn send(&self, cancel: &CancellationToken, message: &AlertMessage) -> crate::Result<()> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": Self::format_text(message),
            "parse_mode": "Markdown",
        });
        post_with_retry(self.http.as_ref(), cancel, &self.api_url(), &payload).await
    }
}
