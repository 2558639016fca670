//! In-memory student directory.
//!
//! Like the backing document store, it accepts duplicate (faculty, matricule)
//! pairs; uniqueness is repaired after the fact by the matricule guard.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::billing::SubscriptionRenewal;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::identity::{MatriculeKey, StudentProfile};
use crate::ports::{AudienceFilter, StudentDirectory};

/// In-memory implementation of the StudentDirectory port.
#[derive(Default)]
pub struct InMemoryStudentDirectory {
    profiles: Mutex<HashMap<UserId, StudentProfile>>,
}

impl InMemoryStudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = StudentProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            profiles: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, StudentProfile>>, DomainError> {
        self.profiles
            .lock()
            .map_err(|_| {
                DomainError::new(ErrorCode::InternalError, "student directory lock poisoned")
            })
    }
}

#[async_trait]
impl StudentDirectory for InMemoryStudentDirectory {
    async fn create(&self, profile: &StudentProfile) -> Result<(), DomainError> {
        let mut map = self.lock()?;
        if map.contains_key(&profile.id) {
            return Err(DomainError::database("student id already exists")
                .with_detail("user_id", profile.id.to_string()));
        }
        map.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StudentProfile>, DomainError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn find_by_matricule(
        &self,
        key: &MatriculeKey,
    ) -> Result<Vec<StudentProfile>, DomainError> {
        Ok(self
            .lock()?
            .values()
            .filter(|p| p.faculty_id == key.faculty_id && p.matricule == key.matricule)
            .cloned()
            .collect())
    }

    async fn apply_renewal(
        &self,
        id: &UserId,
        renewal: &SubscriptionRenewal,
    ) -> Result<(), DomainError> {
        let mut map = self.lock()?;
        let profile = map.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::UserNotFound, "Student not found")
                .with_detail("user_id", id.to_string())
        })?;
        profile.apply_renewal(renewal);
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        Ok(self.lock()?.remove(id).is_some())
    }

    async fn find_broadcast_targets(
        &self,
        filter: &AudienceFilter,
    ) -> Result<Vec<StudentProfile>, DomainError> {
        Ok(self
            .lock()?
            .values()
            .filter(|p| p.push_token().is_some() && filter.matches(p))
            .cloned()
            .collect())
    }
}
