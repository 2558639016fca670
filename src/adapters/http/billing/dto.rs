//! Data Transfer Objects for billing HTTP endpoints.
//!
//! Field names are camelCase on the wire, matching the mobile client.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    AccessBasis, CheckAccessResult, InitiatePaymentResult, RepairSubscriptionsResult,
    SubscriptionView,
};
use crate::domain::billing::{SubscriptionStatus, Transaction, TransactionStatus};
use crate::domain::foundation::Timestamp;

/// Body returned to the provider after a webhook was processed.
pub const WEBHOOK_PROCESSED: &str = "Processed";

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a subscription payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    /// Mobile money number to collect from.
    pub phone_number: String,
}

/// Request to run the subscription repair sweep.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSubscriptionsRequest {
    /// Look-back window; defaults to one renewal period.
    #[serde(default)]
    pub window_days: Option<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    /// Provider payment id; the client polls nothing, it waits for the push.
    pub payment_id: String,
    pub transaction_id: String,
}

impl From<InitiatePaymentResult> for InitiatePaymentResponse {
    fn from(result: InitiatePaymentResult) -> Self {
        Self {
            success: true,
            message: "Payment initiated.".to_string(),
            payment_id: result.provider_payment_id.to_string(),
            transaction_id: result.transaction_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub user_id: String,
    pub status: SubscriptionStatus,
    pub has_access: bool,
    pub last_payment_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
}

impl From<SubscriptionView> for SubscriptionResponse {
    fn from(view: SubscriptionView) -> Self {
        Self {
            user_id: view.user_id.to_string(),
            status: view.status,
            has_access: view.has_access,
            last_payment_date: view.last_payment_date,
            expiry_date: view.expiry_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    pub has_access: bool,
    pub basis: AccessBasis,
}

impl From<CheckAccessResult> for AccessCheckResponse {
    fn from(result: CheckAccessResult) -> Self {
        Self {
            has_access: result.has_access,
            basis: result.basis,
        }
    }
}

/// One ledger entry as shown to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: TransactionStatus,
    pub provider_payment_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Transaction> for PaymentResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount: tx.amount,
            currency: tx.currency,
            kind: tx.kind.as_str().to_string(),
            status: tx.status,
            provider_payment_id: tx.provider_payment_id.map(|p| p.to_string()),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSubscriptionsResponse {
    pub scanned: usize,
    pub repaired: Vec<String>,
    pub missing_users: usize,
}

impl From<RepairSubscriptionsResult> for RepairSubscriptionsResponse {
    fn from(result: RepairSubscriptionsResult) -> Self {
        Self {
            scanned: result.scanned,
            repaired: result.repaired.into_iter().map(|u| u.to_string()).collect(),
            missing_users: result.missing_users,
        }
    }
}
