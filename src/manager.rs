//! Notification manager: validated registration and concurrent fan-out

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::message::AlertMessage;
use crate::notifier::Notifier;

/// Owns the set of validated notifiers and fans alerts out to all of them.
///
/// Delivery is fire-and-forget: [`NotificationManager::send`] spawns one
/// task per notifier and returns without waiting, so a slow or hanging
/// provider never blocks metric evaluation or the other providers.
pub struct NotificationManager {
    notifiers: Vec<Arc<dyn Notifier>>,
    cancel: CancellationToken,
}

impl NotificationManager {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            notifiers: Vec::new(),
            cancel,
        }
    }

    /// Validate and register a notifier.
    ///
    /// A notifier that fails validation is not added to the active set and
    /// will never receive a send call.
    pub fn add_notifier(&mut self, notifier: Arc<dyn Notifier>) -> crate::Result<()> {
        if let Err(e) = notifier.validate() {
            return Err(crate::HostwatchError::Notifier(format!(
                "invalid provider {}: {}",
                notifier.kind(),
                e
            )));
        }
        tracing::debug!("Registered '{}' notifier", notifier.kind());
        self.notifiers.push(notifier);
        Ok(())
    }

    /// Number of registered notifiers
    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    /// Dispatch one alert to every registered notifier concurrently.
    ///
    /// Returns the spawned delivery handles; callers are free to drop them.
    /// Outcomes are logged per notifier, never propagated — one provider's
    /// failure cannot affect the others or the caller.
    pub fn send(&self, message: AlertMessage) -> Vec<JoinHandle<()>> {
        if self.notifiers.is_empty() {
            tracing::info!("No notification providers configured");
            return Vec::new();
        }

        let message = Arc::new(message);
        self.notifiers
            .iter()
            .map(|notifier| {
                let notifier = Arc::clone(notifier);
                let message = Arc::clone(&message);
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    match notifier.send(&cancel, &message).await {
                        Ok(()) => {
                            tracing::info!("Notification sent successfully via {}", notifier.kind());
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to send notification via {}: {}",
                                notifier.kind(),
                                e
                            );
                        }
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AlertLevel;
    use async_trait::async_trait;

    fn test_message() -> AlertMessage {
        AlertMessage {
            level: AlertLevel::Info,
            title: "t".to_string(),
            body: "b".to_string(),
            hostname: "h".to_string(),
            ip: "1.2.3.4".to_string(),
            timestamp: chrono::Local::now(),
            metric: None,
            value: None,
            threshold: None,
        }
    }

    /// A test notifier that can succeed, fail, fail validation, or hang
    #[derive(Debug)]
    struct TestNotifier {
        valid: bool,
        succeed: bool,
        hang: bool,
        calls: Arc<tokio::sync::RwLock<u32>>,
    }

    impl TestNotifier {
        fn new(valid: bool, succeed: bool) -> Self {
            Self {
                valid,
                succeed,
                hang: false,
                calls: Arc::new(tokio::sync::RwLock::new(0)),
            }
        }

        fn hanging() -> Self {
            Self {
                valid: true,
                succeed: true,
                hang: true,
                calls: Arc::new(tokio::sync::RwLock::new(0)),
            }
        }

        async fn call_count(&self) -> u32 {
            *self.calls.read().await
        }
    }

    #[async_trait]
    impl Notifier for TestNotifier {
        fn kind(&self) -> &str {
            "test"
        }

        fn validate(&self) -> crate::Result<()> {
            if self.valid {
                Ok(())
            } else {
                Err(crate::HostwatchError::Config("bad config".to_string()))
            }
        }

        async fn send(
            &self,
            _cancel: &CancellationToken,
            _message: &AlertMessage,
        ) -> crate::Result<()> {
            *self.calls.write().await += 1;
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.succeed {
                Ok(())
            } else {
                Err(crate::HostwatchError::Notifier("test failure".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn add_notifier_registers_valid_notifier() {
        let mut manager = NotificationManager::new(CancellationToken::new());
        manager
            .add_notifier(Arc::new(TestNotifier::new(true, true)))
            .unwrap();
        assert_eq!(manager.notifier_count(), 1);
    }

    #[tokio::test]
    async fn add_notifier_rejects_invalid_notifier() {
        let mut manager = NotificationManager::new(CancellationToken::new());
        let err = manager
            .add_notifier(Arc::new(TestNotifier::new(false, true)))
            .unwrap_err();
        assert!(err.to_string().contains("invalid provider test"), "{err}");
        assert_eq!(manager.notifier_count(), 0);
    }

    #[tokio::test]
    async fn send_with_no_notifiers_is_a_noop() {
        let manager = NotificationManager::new(CancellationToken::new());
        let handles = manager.send(test_message());
        assert!(handles.is_empty());
    }

    #[tokio::test]
    async fn send_reaches_every_notifier() {
        let mut manager = NotificationManager::new(CancellationToken::new());
        let first = Arc::new(TestNotifier::new(true, true));
        let second = Arc::new(TestNotifier::new(true, false));
        manager.add_notifier(Arc::clone(&first) as Arc<dyn Notifier>).unwrap();
        manager.add_notifier(Arc::clone(&second) as Arc<dyn Notifier>).unwrap();

        for handle in manager.send(test_message()) {
            handle.await.unwrap();
        }

        assert_eq!(first.call_count().await, 1);
        assert_eq!(second.call_count().await, 1);
    }

    #[tokio::test]
    async fn hanging_notifier_does_not_block_others() {
        let mut manager = NotificationManager::new(CancellationToken::new());
        let first = Arc::new(TestNotifier::new(true, true));
        let hanging = Arc::new(TestNotifier::hanging());
        let third = Arc::new(TestNotifier::new(true, true));
        manager.add_notifier(Arc::clone(&first) as Arc<dyn Notifier>).unwrap();
        manager.add_notifier(Arc::clone(&hanging) as Arc<dyn Notifier>).unwrap();
        manager.add_notifier(Arc::clone(&third) as Arc<dyn Notifier>).unwrap();

        // send returns immediately with one handle per notifier
        let mut handles = manager.send(test_message());
        assert_eq!(handles.len(), 3);

        // The non-hanging deliveries complete even while the second hangs
        let hanging_handle = handles.remove(1);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(first.call_count().await, 1);
        assert_eq!(third.call_count().await, 1);

        hanging_handle.abort();
    }

    #[tokio::test]
    async fn delivery_failure_is_contained() {
        let mut manager = NotificationManager::new(CancellationToken::new());
        let failing = Arc::new(TestNotifier::new(true, false));
        manager.add_notifier(Arc::clone(&failing) as Arc<dyn Notifier>).unwrap();

        for handle in manager.send(test_message()) {
            handle.await.unwrap();
        }
        assert_eq!(failing.call_count().await, 1);
    }
}
