//! Mock payment provider for tests.
//!
//! Records every collect call and answers with generated (or queued) payment
//! ids. Failures and latency can be injected.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockPaymentProvider::new();
//! provider.fail_next(PaymentError::rejected("invalid phone number"));
//! let result = provider.collect(request).await;
//! assert!(result.is_err());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::ProviderPaymentId;
use crate::ports::{CollectRequest, CollectedPayment, PaymentError, PaymentProvider};

#[derive(Default)]
struct MockState {
    call_log: Vec<CollectRequest>,
    queued_ids: VecDeque<String>,
    next_error: Option<PaymentError>,
    delay: Option<Duration>,
    counter: u64,
}

/// In-memory `PaymentProvider` for tests.
#[derive(Clone, Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the provider payment id returned by the next successful call.
    pub fn with_payment_id(self, id: impl Into<String>) -> Self {
        self.inner.lock().unwrap().queued_ids.push_back(id.into());
        self
    }

    /// Make every call sleep before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.inner.lock().unwrap().delay = Some(delay);
        self
    }

    /// Fail the next call with `error`.
    pub fn fail_next(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    pub fn calls(&self) -> Vec<CollectRequest> {
        self.inner.lock().unwrap().call_log.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().call_log.len()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn collect(&self, request: CollectRequest) -> Result<CollectedPayment, PaymentError> {
        let delay = {
            let mut state = self.inner.lock().unwrap();
            state.call_log.push(request);
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.inner.lock().unwrap();
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        state.counter += 1;
        let raw = state
            .queued_ids
            .pop_front()
            .unwrap_or_else(|| format!("mock_pay_{}", state.counter));

        Ok(CollectedPayment {
            id: ProviderPaymentId::new(raw).map_err(|e| PaymentError::provider(e.to_string()))?,
            status: Some("PENDING".to_string()),
        })
    }
}
