//! Notifier used when no push backend is configured.

use async_trait::async_trait;

use crate::ports::{NotificationError, PushMessage, PushNotifier};

/// Refuses every send. Callers already treat push failures as non-fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushNotifier;

#[async_trait]
impl PushNotifier for DisabledPushNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), NotificationError> {
        tracing::debug!(title = %message.title, "Push disabled, dropping notification");
        Err(NotificationError::Disabled)
    }
}
