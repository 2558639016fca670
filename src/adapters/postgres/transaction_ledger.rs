//! PostgreSQL implementation of TransactionLedger.
//!
//! The status flip is a single conditional `UPDATE ... WHERE status = $expected`;
//! `rows_affected` tells the caller whether it won.

use crate::domain::billing::{Transaction, TransactionKind, TransactionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, ProviderPaymentId, Timestamp, TransactionId, UserId,
};
use crate::ports::TransactionLedger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const PROVIDER_PAYMENT_ID_CONSTRAINT: &str = "transactions_provider_payment_id_key";

/// PostgreSQL implementation of the TransactionLedger port.
pub struct PostgresTransactionLedger {
    pool: PgPool,
}

impl PostgresTransactionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a transaction.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: String,
    amount: i64,
    currency: String,
    kind: String,
    phone_number: String,
    provider_payment_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DomainError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::domain::foundation::ValidationError| {
            DomainError::database(format!("Corrupt transaction row: {}", e))
                .with_detail("transaction_id", row.id.to_string())
        };

        Ok(Transaction {
            id: TransactionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id.clone()).map_err(corrupt)?,
            amount: row.amount,
            currency: row.currency.clone(),
            kind: row.kind.parse::<TransactionKind>().map_err(corrupt)?,
            phone_number: row.phone_number.clone(),
            provider_payment_id: row
                .provider_payment_id
                .clone()
                .map(ProviderPaymentId::new)
                .transpose()
                .map_err(corrupt)?,
            status: row.status.parse::<TransactionStatus>().map_err(corrupt)?,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, amount, currency, kind, phone_number, provider_payment_id,
           status, created_at, updated_at
    FROM transactions
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl TransactionLedger for PostgresTransactionLedger {
    async fn create(&self, transaction: &Transaction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, amount, currency, kind, phone_number,
                provider_payment_id, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.user_id.as_str())
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.kind.as_str())
        .bind(&transaction.phone_number)
        .bind(transaction.provider_payment_id.as_ref().map(|p| p.as_str()))
        .bind(transaction.status.as_str())
        .bind(transaction.created_at.as_datetime())
        .bind(transaction.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create transaction", e))?;

        Ok(())
    }

    async fn attach_provider_payment_id(
        &self,
        id: &TransactionId,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET provider_payment_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(provider_payment_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(PROVIDER_PAYMENT_ID_CONSTRAINT) {
                    return DomainError::new(
                        ErrorCode::DuplicateProviderPayment,
                        "provider payment id already attached to another transaction",
                    )
                    .with_detail("provider_payment_id", provider_payment_id.to_string());
                }
            }
            db_error("Failed to attach provider payment id", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(
                DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                    .with_detail("transaction_id", id.to_string()),
            );
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>, DomainError> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find transaction", e))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &ProviderPaymentId,
    ) -> Result<Option<Transaction>, DomainError> {
        let row: Option<TransactionRow> =
            sqlx::query_as(&format!("{} WHERE provider_payment_id = $1", SELECT_COLUMNS))
                .bind(provider_payment_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find transaction", e))?;

        row.map(Transaction::try_from).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: &TransactionId,
        expected: TransactionStatus,
        target: TransactionStatus,
        at: Timestamp,
    ) -> Result<bool, DomainError> {
        expected.ensure_transition(target)?;
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(target.as_str())
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update transaction status", e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Distinguish a lost race from a missing row
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM transactions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find transaction", e))?;

        match exists {
            Some(_) => Ok(false),
            None => Err(
                DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                    .with_detail("transaction_id", id.to_string()),
            ),
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>, DomainError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list transactions", e))?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn list_successful_since(
        &self,
        since: Timestamp,
    ) -> Result<Vec<Transaction>, DomainError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "{} WHERE status = $1 AND updated_at >= $2 ORDER BY updated_at ASC",
            SELECT_COLUMNS
        ))
        .bind(TransactionStatus::Successful.as_str())
        .bind(since.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list successful transactions", e))?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
