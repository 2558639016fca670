//! Transaction ledger port.
//!
//! The ledger is the single source of truth for "has this payment already been
//! applied". Its only serialization primitive is
//! [`TransactionLedger::compare_and_set_status`], a conditional update that
//! succeeds for exactly one concurrent caller.
//!
//! # Example
//!
//! ```ignore
//! // Only the caller that wins the flip extends the subscription.
//! if ledger
//!     .compare_and_set_status(&tx.id, Pending, Successful, now)
//!     .await?
//! {
//!     directory.apply_renewal(&tx.user_id, &SubscriptionRenewal::starting_at(now)).await?;
//! }
//! ```

use crate::domain::billing::{Transaction, TransactionStatus};
use crate::domain::foundation::{DomainError, ProviderPaymentId, Timestamp, TransactionId, UserId};
use async_trait::async_trait;

/// Durable store of payment transactions.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Persist a new transaction.
    async fn create(&self, transaction: &Transaction) -> Result<(), DomainError>;

    /// Record the provider's payment id on a transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if the transaction doesn't exist
    /// - `DuplicateProviderPayment` if another transaction already holds the id
    async fn attach_provider_payment_id(
        &self,
        id: &TransactionId,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError>;

    /// Look up the unique transaction carrying a provider payment id.
    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Transaction>, DomainError>;

    /// Atomically move `id` from `expected` to `target`.
    ///
    /// Returns `false` without writing if the stored status is no longer
    /// `expected` (another delivery won the race).
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `expected -> target` is not a status
    ///   machine edge; nothing is written
    /// - `TransactionNotFound` if the transaction doesn't exist
    async fn compare_and_set_status(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        target: TransactionStatus,
        at: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Transactions of one user, newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>, DomainError>;

    /// SUCCESSFUL transactions whose outcome was recorded at or after `since`.
    async fn list_successful_since(&self, since: Timestamp)
        -> Result<Vec<Transaction>, DomainError>;
}
