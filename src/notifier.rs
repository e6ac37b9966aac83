//! Notifier trait implemented by each chat provider

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::message::AlertMessage;

/// Trait for delivering alerts to one external chat service.
///
/// Implementations format the provider-agnostic [`AlertMessage`] into their
/// own wire payload and deliver it over HTTPS with the shared retry policy.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Stable identifier for logging (e.g. "slack")
    fn kind(&self) -> &str;

    /// Check credentials and endpoint configuration.
    ///
    /// Side-effect free: performs no network calls. Called once before the
    /// notifier is registered with the manager; a notifier that fails
    /// validation never receives [`Notifier::send`].
    fn validate(&self) -> crate::Result<()>;

    /// Format and deliver one alert, retrying on transient failures.
    ///
    /// Returns `Ok(())` on any single 2xx response; an error once retries
    /// are exhausted or the cancellation token fires.
    async fn send(&self, cancel: &CancellationToken, message: &AlertMessage) -> crate::Result<()>;
}
