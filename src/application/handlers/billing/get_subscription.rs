//! GetSubscriptionHandler - Query handler for the caller's subscription state.

use std::sync::Arc;

use crate::domain::billing::{BillingError, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::StudentDirectory;

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// Subscription fields of one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub has_access: bool,
    pub last_payment_date: Option<Timestamp>,
    pub expiry_date: Option<Timestamp>,
}

pub struct GetSubscriptionHandler {
    directory: Arc<dyn StudentDirectory>,
}

impl GetSubscriptionHandler {
    pub fn new(directory: Arc<dyn StudentDirectory>) -> Self {
        Self { directory }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<SubscriptionView, BillingError> {
        let profile = self
            .directory
            .find_by_id(&query.user_id)
            .await?
            .ok_or_else(|| BillingError::UserNotFound(query.user_id.clone()))?;

        Ok(SubscriptionView {
            user_id: profile.id,
            status: profile.subscription_status,
            has_access: profile.subscription_status.has_access(),
            last_payment_date: profile.last_payment_date,
            expiry_date: profile.subscription_expiry_date,
        })
    }
}
