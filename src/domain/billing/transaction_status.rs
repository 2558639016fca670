//! Transaction status state machine.
//!
//! A payment transaction starts PENDING and is driven to a terminal outcome by
//! provider reports. Reports may arrive duplicated and out of order, so every
//! (current, reported) pair maps to exactly one [`StatusDecision`].

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger status of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Collection requested, no outcome reported yet.
    Pending,

    /// Provider confirmed the payment. Terminal.
    Successful,

    /// Provider reported a failure. A later success report still wins.
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Successful => "SUCCESSFUL",
            TransactionStatus::Failed => "FAILED",
        }
    }

    /// Guard for ledger writes: the move from `self` to `target` must be a
    /// state machine edge.
    pub fn ensure_transition(&self, target: TransactionStatus) -> Result<(), DomainError> {
        if self.can_transition_to(&target) {
            return Ok(());
        }
        Err(DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Transaction cannot move from {} to {}", self, target),
        )
        .with_detail("from", self.as_str())
        .with_detail("to", target.as_str()))
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESSFUL" => Ok(TransactionStatus::Successful),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "transaction_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for TransactionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, target),
            (Pending, Successful) | (Pending, Failed) | (Failed, Successful)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TransactionStatus::*;
        match self {
            Pending => vec![Successful, Failed],
            Failed => vec![Successful],
            Successful => vec![],
        }
    }
}

/// Status carried by a provider notification.
///
/// Anything other than SUCCESSFUL or FAILED is kept verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedStatus {
    Successful,
    Failed,
    Other(String),
}

impl ReportedStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SUCCESSFUL" => ReportedStatus::Successful,
            "FAILED" => ReportedStatus::Failed,
            other => ReportedStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ReportedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportedStatus::Successful => f.write_str("SUCCESSFUL"),
            ReportedStatus::Failed => f.write_str("FAILED"),
            ReportedStatus::Other(s) => f.write_str(s),
        }
    }
}

/// What to do with a transaction given its current status and a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDecision {
    /// Flip to SUCCESSFUL from `from`, then extend the subscription.
    Activate { from: TransactionStatus },

    /// Flip PENDING to FAILED. No subscription change.
    MarkFailed,

    /// Success already recorded.
    AlreadySuccessful,

    /// Failure already recorded.
    AlreadyFailed,

    /// Failure reported after success; success is kept.
    IgnoreLateFailure,

    /// Status the ledger does not track.
    Informational(String),
}

impl StatusDecision {
    /// The status to write, if this decision changes the ledger.
    pub fn target(&self) -> Option<TransactionStatus> {
        match self {
            StatusDecision::Activate { .. } => Some(TransactionStatus::Successful),
            StatusDecision::MarkFailed => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// Maps a reported status onto the current ledger status.
pub fn decide(current: TransactionStatus, reported: &ReportedStatus) -> StatusDecision {
    use TransactionStatus::*;
    match (current, reported) {
        (Successful, ReportedStatus::Successful) => StatusDecision::AlreadySuccessful,
        (from, ReportedStatus::Successful) => StatusDecision::Activate { from },
        (Pending, ReportedStatus::Failed) => StatusDecision::MarkFailed,
        (Failed, ReportedStatus::Failed) => StatusDecision::AlreadyFailed,
        (Successful, ReportedStatus::Failed) => StatusDecision::IgnoreLateFailure,
        (_, ReportedStatus::Other(raw)) => StatusDecision::Informational(raw.clone()),
    }
}
