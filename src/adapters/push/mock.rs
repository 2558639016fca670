//! Recording push notifier for tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{NotificationError, PushMessage, PushNotifier};

#[derive(Default)]
struct MockState {
    sent: Vec<PushMessage>,
    failing_tokens: HashSet<String>,
}

/// In-memory `PushNotifier` that records delivered messages.
#[derive(Clone, Default)]
pub struct MockPushNotifier {
    inner: Arc<Mutex<MockState>>,
}

impl MockPushNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message addressed to `token`.
    pub fn failing_for(self, token: impl Into<String>) -> Self {
        self.inner.lock().unwrap().failing_tokens.insert(token.into());
        self
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.inner.lock().unwrap().sent.len()
    }
}

#[async_trait]
impl PushNotifier for MockPushNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), NotificationError> {
        let mut state = self.inner.lock().unwrap();
        if state.failing_tokens.contains(&message.token) {
            return Err(NotificationError::Rejected(format!(
                "token {} is not registered",
                message.token
            )));
        }
        state.sent.push(message.clone());
        Ok(())
    }
}
