//! CheckAccessHandler - Query handler for subscriber-only material.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, SubscriptionStatus};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::StudentDirectory;

/// Query to check whether the caller may read subscriber-only material.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user: AuthenticatedUser,
}

/// Why access was granted or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessBasis {
    Admin,
    Subscription(SubscriptionStatus),
    NoProfile,
}

/// Result of access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAccessResult {
    pub has_access: bool,
    pub basis: AccessBasis,
}

/// Handler for access checks.
///
/// Admins always have access. Students have access while their subscription
/// status is `trial` or `active`.
pub struct CheckAccessHandler {
    directory: Arc<dyn StudentDirectory>,
}

impl CheckAccessHandler {
    pub fn new(directory: Arc<dyn StudentDirectory>) -> Self {
        Self { directory }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<CheckAccessResult, BillingError> {
        if query.user.is_admin {
            return Ok(CheckAccessResult {
                has_access: true,
                basis: AccessBasis::Admin,
            });
        }

        let result = match self.directory.find_by_id(&query.user.id).await? {
            Some(profile) => CheckAccessResult {
                has_access: profile.subscription_status.has_access(),
                basis: AccessBasis::Subscription(profile.subscription_status),
            },
            None => CheckAccessResult {
                has_access: false,
                basis: AccessBasis::NoProfile,
            },
        };

        Ok(result)
    }
}
