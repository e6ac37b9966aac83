//! Slack incoming-webhook notifier

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;
use crate::message::{AlertLevel, AlertMessage};
use crate::notifier::Notifier;
use crate::retry::post_with_retry;

const SLACK_WEBHOOK_HOST: &str = "hooks.slack.com";

/// Sends alerts to a Slack incoming webhook as plain markdown text
pub struct SlackNotifier {
    webhook_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Webhook URLs embed a secret, keep them out of debug output
        f.debug_struct("SlackNotifier").finish()
    }
}

impl SlackNotifier {
    pub fn new(webhook_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self { webhook_url, http }
    }

    fn format_text(message: &AlertMessage) -> String {
        let emoji = match message.level {
            AlertLevel::Info => ":information_source:",
            AlertLevel::Warning => ":warning:",
            AlertLevel::Error => ":x:",
        };

        let mut text = format!(
            "{} *{}*\n{}\n\n*Server:* {} ({})\n*Time:* {}",
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
impl Notifier for SlackNotifier {
    fn kind(&self) -> &str {
        "slack"
    }

    fn validate(&self) -> crate::Result<()> {
        validate_webhook_url(&self.webhook_url, &[SLACK_WEBHOOK_HOST])
    }

    async fn send(&self, cancel: &CancellationToken, message: &AlertMessage) -> crate::Result<()> {
        let payload = serde_json::json!({ "text": Self::format_text(message) });
        post_with_retry(self.http.as_ref(), cancel, &self.webhook_url, &payload).await
    }
}

/// Check that a webhook URL is non-empty, uses HTTPS, and points at one of
/// the provider's known domains.
pub fn validate_webhook_url(webhook_url: &str, allowed_hosts: &[&str]) -> crate::Result<()> {
    if webhook_url.is_empty() {
        return Err(crate::HostwatchError::Config(
            "webhook URL is required".to_string(),
        ));
    }

    let parsed = reqwest::Url::parse(webhook_url)
        .map_err(|e| crate::HostwatchError::Config(format!("invalid URL format: {}", e)))?;

    if parsed.scheme() != "https" {
        return Err(crate::HostwatchError::Config(
            "webhook URL must use HTTPS".to_string(),
        ));
    }

    let host = parsed.host_str().unwrap_or_default();
    if !allowed_hosts.iter().any(|allowed| host.contains(allowed)) {
        return Err(crate::HostwatchError::Config(format!(
            "webhook URL must be from {}",
            allowed_hosts.join(" or ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};
    use chrono::TimeZone;

    const VALID_URL: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    fn test_message() -> AlertMessage {
        AlertMessage {
            level: AlertLevel::Warning,
            title: "Disk Usage Alert".to_string(),
            body: "Disk usage is 85%, exceeding the configured threshold of 80%.".to_string(),
            hostname: "web-01".to_string(),
            ip: "10.0.0.5".to_string(),
            timestamp: chrono::Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            metric: Some("disk".to_string()),
            value: Some("85%".to_string()),
            threshold: Some("80%".to_string()),
        }
    }

    #[test]
    fn kind_is_slack() {
        let notifier = SlackNotifier::new(VALID_URL.to_string(), Arc::new(MockHttpClient::new()));
        assert_eq!(notifier.kind(), "slack");
    }

    #[test]
    fn validate_accepts_slack_webhook() {
        let notifier = SlackNotifier::new(VALID_URL.to_string(), Arc::new(MockHttpClient::new()));
        notifier.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_url() {
        let notifier = SlackNotifier::new(String::new(), Arc::new(MockHttpClient::new()));
        let err = notifier.validate().unwrap_err();
        assert!(err.to_string().contains("webhook URL is required"));
    }

    #[test]
    fn validate_rejects_http_scheme() {
        let notifier = SlackNotifier::new(
            "http://hooks.slack.com/services/x".to_string(),
            Arc::new(MockHttpClient::new()),
        );
        let err = notifier.validate().unwrap_err();
        assert!(err.to_string().contains("must use HTTPS"));
    }

    #[test]
    fn validate_rejects_foreign_host() {
        let notifier = SlackNotifier::new(
            "https://not-slack.example/x".to_string(),
            Arc::new(MockHttpClient::new()),
        );
        let err = notifier.validate().unwrap_err();
        assert!(err.to_string().contains("hooks.slack.com"), "{err}");
    }

    #[test]
    fn format_includes_severity_marker_and_metric() {
        let text = SlackNotifier::format_text(&test_message());
        assert!(text.starts_with(":warning: *Disk Usage Alert*\n"));
        assert!(text.contains("*Server:* web-01 (10.0.0.5)"));
        assert!(text.contains("*Time:* 2026-03-14 09:26:53"));
        assert!(text.ends_with("*Metric:* disk = 85% (threshold: 80%)"));
    }

    #[test]
    fn format_uses_error_marker_at_error_level() {
        let mut message = test_message();
        message.level = AlertLevel::Error;
        assert!(SlackNotifier::format_text(&message).starts_with(":x: "));

        message.level = AlertLevel::Info;
        assert!(SlackNotifier::format_text(&message).starts_with(":information_source: "));
    }

    #[tokio::test]
    async fn send_posts_text_payload_to_webhook() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_json()
            .withf(|url, body| {
                url == VALID_URL
                    && body["text"]
                        .as_str()
                        .is_some_and(|t| t.contains("Disk Usage Alert"))
            })
            .returning(|_, _| {
                Box::pin(async {
                    Ok(HttpResponse {
                        status: 200,
                        body: "ok".to_string(),
                    })
                })
            });

        let notifier = SlackNotifier::new(VALID_URL.to_string(), Arc::new(mock));
        let cancel = CancellationToken::new();
        notifier.send(&cancel, &test_message()).await.unwrap();
    }
}
