//! InitiatePaymentHandler - Command handler for starting a subscription payment.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::billing::{BillingError, Transaction};
use crate::domain::foundation::{ProviderPaymentId, Timestamp, TransactionId, UserId};
use crate::ports::{CollectRequest, PaymentError, PaymentProvider, TransactionLedger};

/// Price charged for one subscription period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPrice {
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
}

impl Default for SubscriptionPrice {
    fn default() -> Self {
        Self {
            amount: 399,
            currency: "XAF".to_string(),
        }
    }
}

/// Command to start a mobile-money subscription payment.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub user_id: UserId,
    pub phone_number: String,
}

/// Result of a successful initiation.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub transaction_id: TransactionId,
    pub provider_payment_id: ProviderPaymentId,
}

/// Handler for starting subscription payments.
///
/// Records a PENDING transaction before asking the provider to collect, so a
/// later webhook always finds its ledger entry. Provider failures leave the
/// transaction PENDING; the caller may initiate again.
pub struct InitiatePaymentHandler {
    ledger: Arc<dyn TransactionLedger>,
    provider: Arc<dyn PaymentProvider>,
    price: SubscriptionPrice,
    provider_timeout: Duration,
}

impl InitiatePaymentHandler {
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        provider: Arc<dyn PaymentProvider>,
        price: SubscriptionPrice,
    ) -> Self {
        Self {
            ledger,
            provider,
            price,
            provider_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, BillingError> {
        // 1. Build and persist the PENDING ledger entry
        let transaction = Transaction::pending_subscription(
            cmd.user_id,
            self.price.amount,
            self.price.currency.clone(),
            &cmd.phone_number,
            Timestamp::now(),
        )?;
        self.ledger.create(&transaction).await?;

        // 2. Ask the provider to collect, bounded by the timeout
        let request = CollectRequest {
            amount: transaction.amount,
            phone_number: transaction.phone_number.clone(),
            description: transaction.description(),
        };
        let collected = tokio::time::timeout(self.provider_timeout, self.provider.collect(request))
            .await
            .unwrap_or_else(|_| {
                Err(PaymentError::timeout(format!(
                    "no answer within {:?}",
                    self.provider_timeout
                )))
            })
            .map_err(|e| {
                tracing::error!(
                    transaction_id = %transaction.id,
                    user_id = %transaction.user_id,
                    error = %e,
                    provider_code = ?e.provider_code,
                    "Payment initiation failed"
                );
                BillingError::PaymentInitiationFailed
            })?;

        // 3. Link the provider's id to our entry
        self.ledger
            .attach_provider_payment_id(&transaction.id, &collected.id)
            .await?;

        tracing::info!(
            transaction_id = %transaction.id,
            user_id = %transaction.user_id,
            provider_payment_id = %collected.id,
            "Payment initiated"
        );

        Ok(InitiatePaymentResult {
            transaction_id: transaction.id,
            provider_payment_id: collected.id,
        })
    }
}
