//! Push notification port.
//!
//! Delivery is best-effort from the domain's perspective: callers log failures
//! and carry on.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One notification addressed to one device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// In-flight sends per multicast.
pub const MULTICAST_CONCURRENCY: usize = 16;

/// Per-token outcome of a multicast send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MulticastReport {
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),

    #[error("Notification timed out")]
    Timeout,

    #[error("Push notifications are not configured")]
    Disabled,
}

/// Sends push notifications to device tokens.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), NotificationError>;

    /// Send the same notification to many tokens.
    ///
    /// Individual failures are counted, not returned.
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<MulticastReport, NotificationError> {
        let messages: Vec<PushMessage> = tokens
            .iter()
            .map(|token| PushMessage::new(token.as_str(), title, body))
            .collect();

        let report = stream::iter(messages)
            .map(|message| async move { self.send(&message).await })
            .buffer_unordered(MULTICAST_CONCURRENCY)
            .fold(MulticastReport::default(), |mut report, outcome| async move {
                match outcome {
                    Ok(()) => report.success_count += 1,
                    Err(e) => {
                        tracing::debug!(error = %e, "multicast delivery failed for one token");
                        report.failure_count += 1;
                    }
                }
                report
            })
            .await;
        Ok(report)
    }
}
