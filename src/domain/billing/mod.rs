//! Billing domain module.
//!
//! Payment transactions, their status state machine, subscription renewal
//! and the provider webhook trust boundary.
//!
//! # Module Structure
//!
//! - `transaction` - Transaction entity (one payment intent)
//! - `transaction_status` - TransactionStatus state machine and report decisions
//! - `subscription` - SubscriptionStatus and flat renewal window
//! - `payment_notification` - Provider webhook body
//! - `webhook_verifier` - RS256 signature check over the canonical payload
//! - `webhook_errors` / `errors` - Error types with HTTP mapping

mod errors;
mod payment_notification;
mod subscription;
mod transaction;
mod transaction_status;
mod webhook_errors;
mod webhook_verifier;

pub use errors::{BillingError, PAYMENT_INITIATION_FAILED};
pub use payment_notification::PaymentNotification;
pub use subscription::{SubscriptionRenewal, SubscriptionStatus, RENEWAL_PERIOD_DAYS};
pub use transaction::{Transaction, TransactionKind};
pub use transaction_status::{decide, ReportedStatus, StatusDecision, TransactionStatus};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{canonical_payload, verify_signature, WebhookVerifier};

#[cfg(test)]
pub(crate) use webhook_verifier::{fixtures as signing_fixtures, sign_test_payload};
