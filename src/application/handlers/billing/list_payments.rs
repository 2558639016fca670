//! ListPaymentsHandler - Query handler for the caller's payment history.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Transaction};
use crate::domain::foundation::UserId;
use crate::ports::TransactionLedger;

#[derive(Debug, Clone)]
pub struct ListPaymentsQuery {
    pub user_id: UserId,
}

/// Caller's transactions, newest first.
#[derive(Debug, Clone)]
pub struct ListPaymentsResult {
    pub transactions: Vec<Transaction>,
}

pub struct ListPaymentsHandler {
    ledger: Arc<dyn TransactionLedger>,
}

impl ListPaymentsHandler {
    pub fn new(ledger: Arc<dyn TransactionLedger>) -> Self {
        Self { ledger }
    }

    pub async fn handle(
        &self,
        query: ListPaymentsQuery,
    ) -> Result<ListPaymentsResult, BillingError> {
        let transactions = self.ledger.list_for_user(&query.user_id).await?;
        Ok(ListPaymentsResult { transactions })
    }
}
