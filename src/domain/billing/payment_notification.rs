//! Payment notification body posted by the provider to the webhook endpoint.

use serde::Deserialize;

use crate::domain::foundation::ProviderPaymentId;

use super::{ReportedStatus, WebhookError};

/// Fields the reconciler needs from a provider notification.
///
/// The provider sends the full payment object; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    id: String,
    status: String,
}

/// Authenticated provider report about one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub payment_id: ProviderPaymentId,
    pub status: ReportedStatus,
}

impl PaymentNotification {
    /// Parses the raw (already verified) request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawNotification =
            serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let payment_id = ProviderPaymentId::new(raw.id)
            .map_err(|_| WebhookError::MissingField("id"))?;

        Ok(Self {
            payment_id,
            status: ReportedStatus::parse(&raw.status),
        })
    }
}
