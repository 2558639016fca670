//! Transaction entity - one payment attempt and its outcome.
//!
//! # Invariants
//!
//! - `provider_payment_id` is unique across the ledger once set
//! - `status` only moves along [`TransactionStatus`] transitions, enforced by
//!   the ledger's conditional update
//! - Transactions are never deleted; abandoned PENDING entries are tolerated

use crate::domain::foundation::{
    ProviderPaymentId, Timestamp, TransactionId, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TransactionStatus;

/// What a transaction pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Subscription,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Subscription => "SUBSCRIPTION",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBSCRIPTION" => Ok(TransactionKind::Subscription),
            other => Err(ValidationError::invalid_format(
                "transaction_kind",
                format!("unknown kind '{}'", other),
            )),
        }
    }
}

/// Durable record of one payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,

    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub kind: TransactionKind,
    pub phone_number: String,

    /// Set once the provider accepted the collection request.
    pub provider_payment_id: Option<ProviderPaymentId>,
    pub status: TransactionStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Transaction {
    /// Creates a PENDING subscription payment.
    ///
    /// The phone number is trimmed; an empty number is rejected.
    pub fn pending_subscription(
        user_id: UserId,
        amount: i64,
        currency: impl Into<String>,
        phone_number: &str,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(ValidationError::empty_field("phone_number"));
        }
        if amount <= 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be a positive number of minor units",
            ));
        }

        Ok(Self {
            id: TransactionId::new(),
            user_id,
            amount,
            currency: currency.into(),
            kind: TransactionKind::Subscription,
            phone_number: phone_number.to_string(),
            provider_payment_id: None,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Human-readable description sent to the payment provider.
    pub fn description(&self) -> String {
        format!("Subscription for user {}", self.user_id)
    }
}
