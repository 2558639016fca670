//! Admin audit log port.

use crate::domain::foundation::{AuditEntryId, DomainError, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Action recorded when an admin sends a broadcast.
pub const BROADCAST_SENT: &str = "BROADCAST_SENT";

/// Record of a privileged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub action: String,
    pub actor: String,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        actor: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            action: action.into(),
            actor: actor.into(),
            details,
            created_at: Timestamp::now(),
        }
    }
}

/// Append-only store of admin actions.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), DomainError>;

    /// Most recent entries first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DomainError>;
}
