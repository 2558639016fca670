//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;
pub mod identity;
pub mod notifications;

pub use billing::{
    AccessBasis, CheckAccessHandler, CheckAccessQuery, CheckAccessResult, GetSubscriptionHandler,
    GetSubscriptionQuery, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    HandlePaymentWebhookResult, InitiatePaymentCommand, InitiatePaymentHandler,
    InitiatePaymentResult, ListPaymentsHandler, ListPaymentsQuery, ListPaymentsResult,
    ReconcileOutcome, RepairSubscriptionsCommand, RepairSubscriptionsHandler,
    RepairSubscriptionsResult, SubscriptionPrice, SubscriptionView,
};
pub use identity::{
    EnforceMatriculeUniquenessCommand, EnforceMatriculeUniquenessHandler,
    EnforceMatriculeUniquenessResult,
};
pub use notifications::{SendBroadcastCommand, SendBroadcastHandler, SendBroadcastResult};
