//! EnforceMatriculeUniquenessHandler - compensating check run after a student record is created.
//!
//! The store accepts duplicate (faculty, matricule) pairs. After each creation
//! this handler loads every record with the same pair and deletes all but the
//! earliest by (created_at, id). Any single run leaves exactly one record for
//! the pair, whatever order the records became visible in. Runs for the same
//! pair are serialized within this process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::identity::MatriculeKey;
use crate::ports::StudentDirectory;

/// Command issued once per created student record.
#[derive(Debug, Clone)]
pub struct EnforceMatriculeUniquenessCommand {
    pub user_id: UserId,
}

/// What the guard did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforceMatriculeUniquenessResult {
    /// The record no longer exists.
    RecordGone,
    /// No other record shares the pair.
    Unique,
    /// The new record was a duplicate and has been deleted.
    DuplicateRemoved { survivor: UserId },
    /// The new record is the earliest of the group; `duplicates` later records were deleted.
    KeptAsEarliest { duplicates: usize },
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Per-key async locks. Entries are dropped once no run holds them.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<MatriculeKey, KeyLock>>,
}

impl KeyedLocks {
    fn acquire(&self, key: &MatriculeKey) -> Result<KeyLease<'_>, DomainError> {
        let mut locks = self.locks.lock().map_err(|_| poisoned())?;
        let lock = Arc::clone(locks.entry(key.clone()).or_default());
        Ok(KeyLease {
            table: self,
            key: key.clone(),
            lock,
        })
    }
}

/// Share of a key's lock. Dropping it removes the table entry when it was the
/// last share, including when the owning future is cancelled mid-run.
struct KeyLease<'a> {
    table: &'a KeyedLocks,
    key: MatriculeKey,
    lock: KeyLock,
}

impl KeyLease<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for KeyLease<'_> {
    fn drop(&mut self) {
        let Ok(mut locks) = self.table.locks.lock() else {
            return;
        };
        // The table's share plus this one
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "matricule lock table poisoned")
}

pub struct EnforceMatriculeUniquenessHandler {
    directory: Arc<dyn StudentDirectory>,
    locks: KeyedLocks,
}

impl EnforceMatriculeUniquenessHandler {
    pub fn new(directory: Arc<dyn StudentDirectory>) -> Self {
        Self {
            directory,
            locks: KeyedLocks::default(),
        }
    }

    pub async fn handle(
        &self,
        cmd: EnforceMatriculeUniquenessCommand,
    ) -> Result<EnforceMatriculeUniquenessResult, DomainError> {
        let Some(created) = self.directory.find_by_id(&cmd.user_id).await? else {
            return Ok(EnforceMatriculeUniquenessResult::RecordGone);
        };
        let key = created.key();

        let lease = self.locks.acquire(&key)?;
        let _guard = lease.lock().await;
        self.enforce(&cmd.user_id, &key).await
    }

    async fn enforce(
        &self,
        user_id: &UserId,
        key: &MatriculeKey,
    ) -> Result<EnforceMatriculeUniquenessResult, DomainError> {
        let group = self.directory.find_by_matricule(key).await?;

        if !group.iter().any(|p| &p.id == user_id) {
            return Ok(EnforceMatriculeUniquenessResult::RecordGone);
        }
        let Some(survivor) = group.iter().min_by(|a, b| a.seniority().cmp(&b.seniority())) else {
            return Ok(EnforceMatriculeUniquenessResult::Unique);
        };
        if group.len() == 1 {
            return Ok(EnforceMatriculeUniquenessResult::Unique);
        }

        let mut removed = 0;
        for duplicate in group.iter().filter(|p| p.id != survivor.id) {
            if self.directory.delete(&duplicate.id).await? {
                removed += 1;
            }
        }
        tracing::warn!(
            user_id = %user_id,
            survivor = %survivor.id,
            matricule = %key,
            removed,
            "Duplicate matricule detected, deleted all but the earliest record"
        );

        if &survivor.id == user_id {
            Ok(EnforceMatriculeUniquenessResult::KeptAsEarliest {
                duplicates: removed,
            })
        } else {
            Ok(EnforceMatriculeUniquenessResult::DuplicateRemoved {
                survivor: survivor.id.clone(),
            })
        }
    }
}
