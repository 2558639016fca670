//! In-memory transaction ledger.
//!
//! Provides the same conditional-update semantics as the PostgreSQL ledger:
//! `compare_and_set_status` checks and writes under one lock, so exactly one
//! concurrent caller wins, and it refuses moves the status machine forbids.
//! Used by tests and local runs without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::billing::{Transaction, TransactionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, ProviderPaymentId, Timestamp, TransactionId, UserId,
};
use crate::ports::TransactionLedger;

/// In-memory implementation of the TransactionLedger port.
#[derive(Default)]
pub struct InMemoryTransactionLedger {
    transactions: Mutex<HashMap<TransactionId, Transaction>>,
}

impl InMemoryTransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored transaction.
    pub fn all(&self) -> Vec<Transaction> {
        self.transactions
            .lock()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TransactionId, Transaction>>, DomainError> {
        self.transactions
            .lock()
            .map_err(|_| {
                DomainError::new(ErrorCode::InternalError, "transaction ledger lock poisoned")
            })
    }
}

#[async_trait]
impl TransactionLedger for InMemoryTransactionLedger {
    async fn create(&self, transaction: &Transaction) -> Result<(), DomainError> {
        let mut map = self.lock()?;
        if map.contains_key(&transaction.id) {
            return Err(DomainError::database("transaction id already exists")
                .with_detail("transaction_id", transaction.id.to_string()));
        }
        map.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn attach_provider_payment_id(
        &self,
        id: &TransactionId,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<(), DomainError> {
        let mut map = self.lock()?;
        let taken = map.values().any(|t| {
            t.id != *id && t.provider_payment_id.as_ref() == Some(provider_payment_id)
        });
        if taken {
            return Err(DomainError::new(
                ErrorCode::DuplicateProviderPayment,
                "provider payment id already attached to another transaction",
            )
            .with_detail("provider_payment_id", provider_payment_id.to_string()));
        }

        let transaction = map.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                .with_detail("transaction_id", id.to_string())
        })?;
        transaction.provider_payment_id = Some(provider_payment_id.clone());
        transaction.updated_at = Timestamp::now();
        Ok(())
    }

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Transaction>, DomainError> {
        Ok(self
            .lock()?
            .values()
            .find(|t| t.provider_payment_id.as_ref() == Some(provider_payment_id))
            .cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        target: TransactionStatus,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        expected.ensure_transition(target)?;
        let mut map = self.lock()?;
        match map.get_mut(id) {
            Some(transaction) if transaction.status == expected => {
                transaction.status = target;
                transaction.updated_at = at;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                .with_detail("transaction_id", id.to_string())),
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>, DomainError> {
        let mut list: Vec<Transaction> = self
            .lock()?
            .values()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn list_successful_since(
        &self,
        since: Timestamp,
    ) -> Result<Vec<Transaction>, DomainError> {
        let mut list: Vec<Transaction> = self
            .lock()?
            .values()
            .filter(|t| t.status == TransactionStatus::Successful)
            .filter(|t| !t.updated_at.is_before(&since))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(list)
    }
}
