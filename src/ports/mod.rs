//! Ports - interfaces between the domain and the outside world.
//!
//! Each port is an `async_trait` with `Send + Sync` bounds so adapters can be
//! shared as `Arc<dyn Port>` across request handlers.
//!
//! - `TransactionLedger` - payment transactions and the conditional status flip
//! - `StudentDirectory` - student identity records and subscription fields
//! - `PaymentProvider` - outbound mobile-money collection
//! - `PushNotifier` - device push notifications
//! - `SessionValidator` - bearer token validation
//! - `AuditLog` - admin action trail

mod audit_log;
mod payment_provider;
mod push_notifier;
mod session_validator;
mod student_directory;
mod transaction_ledger;

pub use audit_log::{AuditEntry, AuditLog, BROADCAST_SENT};
pub use payment_provider::{
    CollectRequest, CollectedPayment, PaymentError, PaymentErrorCode, PaymentProvider,
};
pub use push_notifier::{MulticastReport, NotificationError, PushMessage, PushNotifier};
pub use session_validator::SessionValidator;
pub use student_directory::{AudienceFilter, StudentDirectory};
pub use transaction_ledger::TransactionLedger;
