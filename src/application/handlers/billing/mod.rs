//! Billing handlers.
//!
//! ## Commands
//! - Initiating a subscription payment
//! - Processing provider payment webhooks
//! - Repairing subscriptions left behind by interrupted reconciliation
//!
//! ## Queries
//! - Get the caller's subscription
//! - Check access to subscriber-only material
//! - List the caller's payments

mod check_access;
mod get_subscription;
mod handle_payment_webhook;
mod initiate_payment;
mod list_payments;
mod repair_subscriptions;

// Commands
pub use handle_payment_webhook::{
    ConfirmationOutcome, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    HandlePaymentWebhookResult, ReconcileOutcome, CONFIRMATION_BODY, CONFIRMATION_TITLE,
};
pub use initiate_payment::{
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult, SubscriptionPrice,
};
pub use repair_subscriptions::{
    RepairSubscriptionsCommand, RepairSubscriptionsHandler, RepairSubscriptionsResult,
};

// Queries
pub use check_access::{AccessBasis, CheckAccessHandler, CheckAccessQuery, CheckAccessResult};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, SubscriptionView};
pub use list_payments::{ListPaymentsHandler, ListPaymentsQuery, ListPaymentsResult};
