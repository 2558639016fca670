//! Student directory port.
//!
//! Access to student identity records. The backing store offers no
//! uniqueness constraint on (faculty, matricule); see the matricule guard.

use crate::domain::billing::SubscriptionRenewal;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::identity::{MatriculeKey, StudentProfile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Broadcast audience selection. `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceFilter {
    pub faculty_id: Option<String>,
    pub level: Option<String>,
}

impl AudienceFilter {
    pub fn matches(&self, profile: &StudentProfile) -> bool {
        let faculty_ok = self
            .faculty_id
            .as_deref()
            .map_or(true, |f| profile.faculty_id == f);
        let level_ok = self
            .level
            .as_deref()
            .map_or(true, |l| profile.level.as_deref() == Some(l));
        faculty_ok && level_ok
    }
}

/// Read/write access to student identity records.
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    /// Persist a new record. No uniqueness check is performed.
    async fn create(&self, profile: &StudentProfile) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StudentProfile>, DomainError>;

    /// All records sharing a (faculty, matricule) key.
    async fn find_by_matricule(&self, key: &MatriculeKey)
        -> Result<Vec<StudentProfile>, DomainError>;

    /// Write subscription fields from a renewal.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the record doesn't exist
    async fn apply_renewal(
        &self,
        id: &UserId,
        renewal: &SubscriptionRenewal,
    ) -> Result<(), DomainError>;

    /// Delete a record. Returns `false` if it was already gone.
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// Records with a non-blank push token matching the filter.
    async fn find_broadcast_targets(
        &self,
        filter: &AudienceFilter,
    ) -> Result<Vec<StudentProfile>, DomainError>;
}
