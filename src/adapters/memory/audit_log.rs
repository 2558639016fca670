//! In-memory admin audit log.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AuditEntry, AuditLog};

#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DomainError> {
        self.entries
            .lock()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "audit log lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DomainError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "audit log lock poisoned"))?;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}
