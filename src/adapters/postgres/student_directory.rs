//! PostgreSQL implementation of StudentDirectory.
//!
//! The `students` table has no unique index on (faculty_id, matricule);
//! duplicates are resolved by the matricule guard.

use crate::domain::billing::{SubscriptionRenewal, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::identity::{MatriculeKey, StudentProfile};
use crate::ports::{AudienceFilter, StudentDirectory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL implementation of the StudentDirectory port.
pub struct PostgresStudentDirectory {
    pool: PgPool,
}

impl PostgresStudentDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StudentRow {
    id: String,
    faculty_id: String,
    matricule: String,
    level: Option<String>,
    notification_token: Option<String>,
    subscription_status: String,
    last_payment_date: Option<DateTime<Utc>>,
    subscription_expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StudentRow> for StudentProfile {
    type Error = DomainError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let id = UserId::new(row.id)
            .map_err(|e| DomainError::database(format!("Invalid student id: {}", e)))?;
        let subscription_status = row
            .subscription_status
            .parse::<SubscriptionStatus>()
            .map_err(|e| {
                DomainError::database(format!("Invalid subscription status: {}", e))
                    .with_detail("user_id", id.to_string())
            })?;

        Ok(StudentProfile {
            id,
            faculty_id: row.faculty_id,
            matricule: row.matricule,
            level: row.level,
            notification_token: row.notification_token,
            subscription_status,
            last_payment_date: row.last_payment_date.map(Timestamp::from_datetime),
            subscription_expiry_date: row.subscription_expiry_date.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, faculty_id, matricule, level, notification_token, subscription_status,
           last_payment_date, subscription_expiry_date, created_at
    FROM students
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, e))
}

#[async_trait]
impl StudentDirectory for PostgresStudentDirectory {
    async fn create(&self, profile: &StudentProfile) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO students (
                id, faculty_id, matricule, level, notification_token, subscription_status,
                last_payment_date, subscription_expiry_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile.id.as_str())
        .bind(&profile.faculty_id)
        .bind(&profile.matricule)
        .bind(&profile.level)
        .bind(&profile.notification_token)
        .bind(profile.subscription_status.as_str())
        .bind(profile.last_payment_date.map(|t| *t.as_datetime()))
        .bind(profile.subscription_expiry_date.map(|t| *t.as_datetime()))
        .bind(profile.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create student", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StudentProfile>, DomainError> {
        let row: Option<StudentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find student", e))?;

        row.map(StudentProfile::try_from).transpose()
    }

    async fn find_by_matricule(
        &self,
        key: &MatriculeKey,
    ) -> Result<Vec<StudentProfile>, DomainError> {
        let rows: Vec<StudentRow> = sqlx::query_as(&format!(
            "{} WHERE faculty_id = $1 AND matricule = $2 ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS
        ))
        .bind(&key.faculty_id)
        .bind(&key.matricule)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query students by matricule", e))?;

        rows.into_iter().map(StudentProfile::try_from).collect()
    }

    async fn apply_renewal(
        &self,
        id: &UserId,
        renewal: &SubscriptionRenewal,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE students SET
                subscription_status = $2,
                last_payment_date = $3,
                subscription_expiry_date = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(renewal.status.as_str())
        .bind(renewal.last_payment_date.as_datetime())
        .bind(renewal.expiry_date.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "Student not found")
                .with_detail("user_id", id.to_string()));
        }

        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete student", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_broadcast_targets(
        &self,
        filter: &AudienceFilter,
    ) -> Result<Vec<StudentProfile>, DomainError> {
        let rows: Vec<StudentRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE notification_token IS NOT NULL
              AND btrim(notification_token) <> ''
              AND ($1::text IS NULL OR faculty_id = $1)
              AND ($2::text IS NULL OR level = $2)
            "#,
            SELECT_COLUMNS
        ))
        .bind(&filter.faculty_id)
        .bind(&filter.level)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to query broadcast targets", e))?;

        rows.into_iter().map(StudentProfile::try_from).collect()
    }
}
