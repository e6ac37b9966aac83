//! Shared HTTP delivery helper with retry

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::io::HttpClient;

/// Total delivery attempts before giving up
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// POST a JSON payload, retrying on transport errors and non-2xx responses.
///
/// Attempts are strictly sequential. Any 2xx response ends the loop with
/// success. Cancellation abandons the in-flight request and skips any
/// remaining attempts.
pub async fn post_with_retry(
    http: &dyn HttpClient,
    cancel: &CancellationToken,
    url: &str,
    payload: &serde_json::Value,
) -> crate::Result<()> {
    for attempt in 1..=MAX_ATTEMPTS {
        if cancel.is_cancelled() {
            return Err(crate::HostwatchError::Cancelled);
        }

        let response = tokio::select! {
            response = http.post_json(url, payload) => response,
            _ = cancel.cancelled() => return Err(crate::HostwatchError::Cancelled),
        };

        match response {
            Ok(response) if (200..300).contains(&response.status) => return Ok(()),
            Ok(response) => {
                tracing::debug!(
                    "Attempt {}/{} got status {}: {}",
                    attempt,
                    MAX_ATTEMPTS,
                    response.status,
                    response.body
                );
            }
            Err(e) => {
                tracing::debug!("Attempt {}/{} failed: {}", attempt, MAX_ATTEMPTS, e);
            }
        }

        if attempt < MAX_ATTEMPTS {
            tokio::select! {
                _ = tokio::time::sleep(RETRY_DELAY) => {}
                _ = cancel.cancelled() => return Err(crate::HostwatchError::Cancelled),
            }
        }
    }

    Err(crate::HostwatchError::Notifier(format!(
        "delivery failed after {} attempts",
        MAX_ATTEMPTS
    )))
}
