//! RepairSubscriptionsHandler - re-applies renewals lost between ledger and user writes.
//!
//! Reconciliation flips the transaction to SUCCESSFUL before extending the
//! user's subscription. A crash in between leaves a SUCCESSFUL transaction
//! whose user was never extended. This sweep finds those and applies the same
//! renewal, dated at the transaction's success time. It never touches the
//! transaction itself.

use std::sync::Arc;

use crate::domain::billing::{BillingError, SubscriptionRenewal, RENEWAL_PERIOD_DAYS};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{StudentDirectory, TransactionLedger};

/// Command to run the repair sweep.
#[derive(Debug, Clone)]
pub struct RepairSubscriptionsCommand {
    /// How far back to look for successful transactions.
    pub window_days: i64,
}

impl Default for RepairSubscriptionsCommand {
    fn default() -> Self {
        Self {
            window_days: RENEWAL_PERIOD_DAYS,
        }
    }
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairSubscriptionsResult {
    /// Successful transactions inspected.
    pub scanned: usize,
    /// Users whose subscription was re-extended.
    pub repaired: Vec<UserId>,
    /// Successful transactions whose user record no longer exists.
    pub missing_users: usize,
}

pub struct RepairSubscriptionsHandler {
    ledger: Arc<dyn TransactionLedger>,
    directory: Arc<dyn StudentDirectory>,
}

impl RepairSubscriptionsHandler {
    pub fn new(ledger: Arc<dyn TransactionLedger>, directory: Arc<dyn StudentDirectory>) -> Self {
        Self { ledger, directory }
    }

    pub async fn handle(
        &self,
        cmd: RepairSubscriptionsCommand,
    ) -> Result<RepairSubscriptionsResult, BillingError> {
        if cmd.window_days <= 0 {
            return Err(BillingError::validation("window_days", "must be positive"));
        }

        let since = Timestamp::now().minus_days(cmd.window_days);
        let transactions = self.ledger.list_successful_since(since).await?;

        let mut result = RepairSubscriptionsResult {
            scanned: transactions.len(),
            ..Default::default()
        };

        // Oldest first, so a later payment for the same user is applied last
        for tx in transactions {
            let Some(profile) = self.directory.find_by_id(&tx.user_id).await? else {
                tracing::warn!(
                    transaction_id = %tx.id,
                    user_id = %tx.user_id,
                    "Successful transaction for missing user"
                );
                result.missing_users += 1;
                continue;
            };

            let already_extended = profile
                .last_payment_date
                .map_or(false, |paid| !paid.is_before(&tx.updated_at));
            if already_extended {
                continue;
            }

            let renewal = SubscriptionRenewal::starting_at(tx.updated_at);
            self.directory.apply_renewal(&tx.user_id, &renewal).await?;

            tracing::warn!(
                transaction_id = %tx.id,
                user_id = %tx.user_id,
                expiry_date = %renewal.expiry_date,
                "Repaired subscription for successful transaction"
            );
            result.repaired.push(tx.user_id);
        }

        tracing::info!(
            scanned = result.scanned,
            repaired = result.repaired.len(),
            missing_users = result.missing_users,
            "Subscription repair sweep finished"
        );

        Ok(result)
    }
}
