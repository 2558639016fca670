//! PostgreSQL implementation of AuditLog.

use crate::domain::foundation::{AuditEntryId, DomainError, Timestamp};
use crate::ports::{AuditEntry, AuditLog};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    action: String,
    actor: String,
    details: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: AuditEntryId::from_uuid(row.id),
            action: row.action,
            actor: row.actor,
            details: row.details.0,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO admin_audit_log (id, action, actor, details, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(&entry.action)
        .bind(&entry.actor)
        .bind(Json(&entry.details))
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record audit entry: {}", e)))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DomainError> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, action, actor, details, created_at
            FROM admin_audit_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to read audit log: {}", e)))?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
