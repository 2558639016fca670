//! Subscription state carried on the student identity record.

use crate::domain::foundation::{Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the window opened by one successful payment.
pub const RENEWAL_PERIOD_DAYS: i64 = 30;

/// Subscription status of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Free trial granted at registration.
    Trial,

    /// Paid and within the current window.
    Active,

    /// Window ended without renewal.
    Expired,

    /// Renewal attempted and failed.
    PastDue,

    /// Student cancelled.
    Canceled,
}

impl SubscriptionStatus {
    /// Returns true if this status grants access to subscriber-only material.
    pub fn has_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Trial | SubscriptionStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(SubscriptionStatus::Trial),
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Subscription fields written after a successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRenewal {
    pub status: SubscriptionStatus,
    pub last_payment_date: Timestamp,
    pub expiry_date: Timestamp,
}

impl SubscriptionRenewal {
    /// Flat renewal: the window always restarts at `paid_at`.
    ///
    /// Remaining time from a previous window is not carried over.
    pub fn starting_at(paid_at: Timestamp) -> Self {
        Self {
            status: SubscriptionStatus::Active,
            last_payment_date: paid_at,
            expiry_date: paid_at.add_days(RENEWAL_PERIOD_DAYS),
        }
    }
}
