//! HandlePaymentWebhookHandler - Command handler for provider payment callbacks.
//!
//! Authenticates the callback, then reconciles the reported status into the
//! ledger. Callbacks are at-least-once and may arrive out of order; the
//! ledger's conditional status flip guarantees a subscription is extended at
//! most once per transaction.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::billing::{
    decide, PaymentNotification, ReportedStatus, StatusDecision, SubscriptionRenewal,
    TransactionStatus, WebhookError, WebhookVerifier,
};
use crate::domain::foundation::{
    DomainError, ProviderPaymentId, Timestamp, TransactionId, UserId,
};
use crate::ports::{
    NotificationError, PushMessage, PushNotifier, StudentDirectory, TransactionLedger,
};

pub const CONFIRMATION_TITLE: &str = "Payment Confirmed! ✅";
pub const CONFIRMATION_BODY: &str = "Your subscription is now active.";

/// A lost status race is retried against the fresh status. Each retry observes
/// a strictly later status, so three attempts cover every interleaving.
const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// Command carrying a raw provider callback.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Body bytes exactly as received.
    pub raw_body: Vec<u8>,
    /// `X-Signature` header.
    pub signature: Option<String>,
    /// `X-Timestamp` header.
    pub timestamp: Option<String>,
}

/// What reconciliation did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Transaction flipped to SUCCESSFUL and the subscription was extended.
    Activated {
        transaction_id: TransactionId,
        user_id: UserId,
        expiry_date: Timestamp,
    },
    /// Transaction flipped from PENDING to FAILED.
    MarkedFailed { transaction_id: TransactionId },
    /// Success was already recorded; nothing changed.
    AlreadyApplied { transaction_id: TransactionId },
    /// Failure was already recorded; nothing changed.
    AlreadyFailed { transaction_id: TransactionId },
    /// Failure reported after success; success kept.
    LateFailureIgnored { transaction_id: TransactionId },
    /// Status the ledger does not track.
    Informational {
        transaction_id: TransactionId,
        status: String,
    },
    /// No transaction carries this provider payment id.
    UnknownTransaction,
}

/// What happened to the confirmation push after an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Sent,
    /// The student has no device token.
    NoToken,
    /// Push delivery is switched off for this deployment.
    Disabled,
    Failed,
    TimedOut,
}

/// Result of webhook processing.
#[derive(Debug)]
pub struct HandlePaymentWebhookResult {
    pub outcome: ReconcileOutcome,
    /// Detached confirmation push, present after an activation.
    pub confirmation: Option<JoinHandle<ConfirmationOutcome>>,
}

/// Handler for provider payment callbacks.
pub struct HandlePaymentWebhookHandler {
    verifier: WebhookVerifier,
    ledger: Arc<dyn TransactionLedger>,
    directory: Arc<dyn StudentDirectory>,
    notifier: Arc<dyn PushNotifier>,
    notification_timeout: Duration,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: WebhookVerifier,
        ledger: Arc<dyn TransactionLedger>,
        directory: Arc<dyn StudentDirectory>,
        notifier: Arc<dyn PushNotifier>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            directory,
            notifier,
            notification_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_notification_timeout(mut self, timeout: Duration) -> Self {
        self.notification_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        // 1. Authenticate; nothing is looked up before this succeeds
        self.verifier
            .authenticate(
                cmd.signature.as_deref(),
                cmd.timestamp.as_deref(),
                &cmd.raw_body,
            )
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected payment webhook");
                e
            })?;

        // 2. Parse the authenticated body
        let notification = PaymentNotification::from_slice(&cmd.raw_body)?;

        // 3. Reconcile
        self.reconcile(&notification.payment_id, &notification.status)
            .await
    }

    /// Applies a reported status to the transaction carrying `payment_id`.
    pub async fn reconcile(
        &self,
        payment_id: &ProviderPaymentId,
        reported: &ReportedStatus,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        for _ in 0..MAX_RECONCILE_ATTEMPTS {
            let transaction = match self
                .ledger
                .find_by_provider_payment_id(payment_id)
                .await
                .map_err(store_error)?
            {
                Some(t) => t,
                None => {
                    tracing::warn!(
                        provider_payment_id = %payment_id,
                        status = %reported,
                        "Webhook for unknown transaction"
                    );
                    return Ok(done(ReconcileOutcome::UnknownTransaction));
                }
            };
            let transaction_id = transaction.id;

            let decision = decide(transaction.status, reported);
            let outcome = match decision {
                StatusDecision::Activate { from } => {
                    let now = Timestamp::now();
                    if !self
                        .ledger
                        .compare_and_set_status(
                            &transaction_id,
                            from,
                            TransactionStatus::Successful,
                            now,
                        )
                        .await
                        .map_err(store_error)?
                    {
                        continue;
                    }

                    let renewal = SubscriptionRenewal::starting_at(now);
                    self.directory
                        .apply_renewal(&transaction.user_id, &renewal)
                        .await
                        .map_err(|e| {
                            tracing::error!(
                                transaction_id = %transaction_id,
                                user_id = %transaction.user_id,
                                error = %e,
                                "Transaction marked successful but subscription not extended"
                            );
                            store_error(e)
                        })?;

                    tracing::info!(
                        transaction_id = %transaction_id,
                        user_id = %transaction.user_id,
                        expiry_date = %renewal.expiry_date,
                        "Subscription activated"
                    );

                    let confirmation = self.spawn_confirmation(transaction.user_id.clone());
                    return Ok(HandlePaymentWebhookResult {
                        outcome: ReconcileOutcome::Activated {
                            transaction_id,
                            user_id: transaction.user_id,
                            expiry_date: renewal.expiry_date,
                        },
                        confirmation: Some(confirmation),
                    });
                }
                StatusDecision::MarkFailed => {
                    if !self
                        .ledger
                        .compare_and_set_status(
                            &transaction_id,
                            TransactionStatus::Pending,
                            TransactionStatus::Failed,
                            Timestamp::now(),
                        )
                        .await
                        .map_err(store_error)?
                    {
                        continue;
                    }
                    tracing::info!(transaction_id = %transaction_id, "Payment failed");
                    ReconcileOutcome::MarkedFailed { transaction_id }
                }
                StatusDecision::AlreadySuccessful => {
                    tracing::debug!(transaction_id = %transaction_id, "Duplicate success webhook");
                    ReconcileOutcome::AlreadyApplied { transaction_id }
                }
                StatusDecision::AlreadyFailed => ReconcileOutcome::AlreadyFailed { transaction_id },
                StatusDecision::IgnoreLateFailure => {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        "Failure reported for a successful transaction, ignoring"
                    );
                    ReconcileOutcome::LateFailureIgnored { transaction_id }
                }
                StatusDecision::Informational(status) => {
                    tracing::info!(
                        transaction_id = %transaction_id,
                        status = %status,
                        "Informational payment status"
                    );
                    ReconcileOutcome::Informational {
                        transaction_id,
                        status,
                    }
                }
            };
            return Ok(done(outcome));
        }

        Err(WebhookError::Database(format!(
            "status of payment {} kept changing during reconciliation",
            payment_id
        )))
    }

    /// Best-effort confirmation push, detached from the caller.
    fn spawn_confirmation(&self, user_id: UserId) -> JoinHandle<ConfirmationOutcome> {
        let directory = Arc::clone(&self.directory);
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notification_timeout;

        tokio::spawn(async move {
            let token = match directory.find_by_id(&user_id).await {
                Ok(Some(profile)) => profile.push_token().map(str::to_string),
                Ok(None) => None,
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Push notification failed");
                    return ConfirmationOutcome::Failed;
                }
            };
            let Some(token) = token else {
                return ConfirmationOutcome::NoToken;
            };

            let message = PushMessage::new(token, CONFIRMATION_TITLE, CONFIRMATION_BODY);
            match tokio::time::timeout(timeout, notifier.send(&message)).await {
                Ok(Ok(())) => {
                    tracing::debug!(user_id = %user_id, "Payment confirmation sent");
                    ConfirmationOutcome::Sent
                }
                Ok(Err(NotificationError::Disabled)) => {
                    tracing::debug!(user_id = %user_id, "Push disabled, confirmation skipped");
                    ConfirmationOutcome::Disabled
                }
                Ok(Err(e)) => {
                    tracing::error!(user_id = %user_id, error = %e, "Push notification failed");
                    ConfirmationOutcome::Failed
                }
                Err(_) => {
                    tracing::error!(user_id = %user_id, "Push notification timed out");
                    ConfirmationOutcome::TimedOut
                }
            }
        })
    }
}

fn done(outcome: ReconcileOutcome) -> HandlePaymentWebhookResult {
    HandlePaymentWebhookResult {
        outcome,
        confirmation: None,
    }
}

fn store_error(e: DomainError) -> WebhookError {
    WebhookError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryStudentDirectory, InMemoryTransactionLedger};
    use crate::adapters::push::{DisabledPushNotifier, MockPushNotifier};
    use crate::domain::billing::signing_fixtures::{
        CALLBACK_URL, OTHER_PRIVATE_KEY, PROVIDER_PRIVATE_KEY, PROVIDER_PUBLIC_KEY,
    };
    use crate::domain::billing::{sign_test_payload, SubscriptionStatus, Transaction};
    use crate::domain::identity::{MatriculeKey, StudentProfile};

    const TS: &str = "1717243200";

    struct Fixture {
        ledger: Arc<InMemoryTransactionLedger>,
        directory: Arc<InMemoryStudentDirectory>,
        notifier: MockPushNotifier,
        handler: HandlePaymentWebhookHandler,
    }

    fn fixture(notifier: MockPushNotifier) -> Fixture {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let directory = Arc::new(InMemoryStudentDirectory::with_profiles([StudentProfile::register(
            UserId::new("student-1").unwrap(),
            MatriculeKey::new("F1", "M1").unwrap(),
            None,
            Timestamp::now(),
        )
        .with_notification_token("device-1")]));
        let handler = HandlePaymentWebhookHandler::new(
            WebhookVerifier::new(CALLBACK_URL, PROVIDER_PUBLIC_KEY),
            ledger.clone(),
            directory.clone(),
            Arc::new(notifier.clone()),
        );
        Fixture {
            ledger,
            directory,
            notifier,
            handler,
        }
    }

    async fn seed_pending(ledger: &InMemoryTransactionLedger, payment_id: &str) -> TransactionId {
        let tx = Transaction::pending_subscription(
            UserId::new("student-1").unwrap(),
            399,
            "XAF",
            "670000000",
            Timestamp::now(),
        )
        .unwrap();
        ledger.create(&tx).await.unwrap();
        ledger
            .attach_provider_payment_id(&tx.id, &ProviderPaymentId::new(payment_id).unwrap())
            .await
            .unwrap();
        tx.id
    }

    fn signed(body: &str) -> HandlePaymentWebhookCommand {
        HandlePaymentWebhookCommand {
            raw_body: body.as_bytes().to_vec(),
            signature: Some(sign_test_payload(
                PROVIDER_PRIVATE_KEY,
                TS,
                CALLBACK_URL,
                body.as_bytes(),
            )),
            timestamp: Some(TS.to_string()),
        }
    }

    async fn student(directory: &InMemoryStudentDirectory) -> StudentProfile {
        directory
            .find_by_id(&UserId::new("student-1").unwrap())
            .await
            .unwrap()
            .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Authentication Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_rejected_before_lookup() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;
        let mut cmd = signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#);
        cmd.signature = None;

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingHeader("X-Signature")));
        assert_eq!(err.status_code(), 400);
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn missing_timestamp_is_rejected() {
        let f = fixture(MockPushNotifier::new());
        let mut cmd = signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#);
        cmd.timestamp = None;

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingHeader("X-Timestamp")));
    }

    #[tokio::test]
    async fn forged_signature_is_unauthorized() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;
        let body = r#"{"id":"pay_1","status":"SUCCESSFUL"}"#;
        let cmd = HandlePaymentWebhookCommand {
            raw_body: body.as_bytes().to_vec(),
            signature: Some(sign_test_payload(
                OTHER_PRIVATE_KEY,
                TS,
                CALLBACK_URL,
                body.as_bytes(),
            )),
            timestamp: Some(TS.to_string()),
        };

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(err.status_code(), 401);
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn authenticated_but_malformed_body_is_bad_request() {
        let f = fixture(MockPushNotifier::new());

        let err = f.handler.handle(signed(r#"{"status":"SUCCESSFUL"}"#)).await.unwrap_err();

        assert_eq!(err.status_code(), 400);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Reconciliation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn success_activates_subscription_for_thirty_days() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        let expiry = match result.outcome {
            ReconcileOutcome::Activated {
                transaction_id,
                expiry_date,
                ..
            } => {
                assert_eq!(transaction_id, id);
                expiry_date
            }
            other => panic!("expected activation, got {:?}", other),
        };
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Successful);

        let profile = student(&f.directory).await;
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_expiry_date, Some(expiry));
        let paid = profile.last_payment_date.unwrap();
        assert_eq!(expiry, paid.add_days(30));
    }

    #[tokio::test]
    async fn activation_sends_confirmation_push() {
        let f = fixture(MockPushNotifier::new());
        seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();
        let pushed = result.confirmation.unwrap().await.unwrap();

        assert_eq!(pushed, ConfirmationOutcome::Sent);
        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "device-1");
        assert_eq!(sent[0].title, CONFIRMATION_TITLE);
    }

    #[tokio::test]
    async fn notification_failure_does_not_affect_outcome() {
        let f = fixture(MockPushNotifier::new().failing_for("device-1"));
        let id = seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();
        let pushed = result.confirmation.unwrap().await.unwrap();

        assert_eq!(pushed, ConfirmationOutcome::Failed);
        assert!(matches!(result.outcome, ReconcileOutcome::Activated { .. }));
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Successful);
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn disabled_push_is_reported_as_skipped_not_failed() {
        let f = fixture(MockPushNotifier::new());
        let handler = HandlePaymentWebhookHandler::new(
            WebhookVerifier::new(CALLBACK_URL, PROVIDER_PUBLIC_KEY),
            f.ledger.clone(),
            f.directory.clone(),
            Arc::new(DisabledPushNotifier),
        );
        let id = seed_pending(&f.ledger, "pay_1").await;

        let result = handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();
        let pushed = result.confirmation.unwrap().await.unwrap();

        assert_eq!(pushed, ConfirmationOutcome::Disabled);
        assert!(matches!(result.outcome, ReconcileOutcome::Activated { .. }));
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Successful);
    }

    #[tokio::test]
    async fn student_without_device_token_gets_no_push() {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let directory = Arc::new(InMemoryStudentDirectory::with_profiles([
            StudentProfile::register(
                UserId::new("student-1").unwrap(),
                MatriculeKey::new("F1", "M1").unwrap(),
                None,
                Timestamp::now(),
            ),
        ]));
        let notifier = MockPushNotifier::new();
        let handler = HandlePaymentWebhookHandler::new(
            WebhookVerifier::new(CALLBACK_URL, PROVIDER_PUBLIC_KEY),
            ledger.clone(),
            directory,
            Arc::new(notifier.clone()),
        );
        seed_pending(&ledger, "pay_1").await;

        let result = handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        assert_eq!(result.confirmation.unwrap().await.unwrap(), ConfirmationOutcome::NoToken);
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_success_is_a_no_op() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;
        let body = r#"{"id":"pay_1","status":"SUCCESSFUL"}"#;

        f.handler.handle(signed(body)).await.unwrap();
        let first_expiry = student(&f.directory).await.subscription_expiry_date;

        let second = f.handler.handle(signed(body)).await.unwrap();

        assert_eq!(second.outcome, ReconcileOutcome::AlreadyApplied { transaction_id: id });
        assert!(second.confirmation.is_none());
        assert_eq!(student(&f.directory).await.subscription_expiry_date, first_expiry);
    }

    #[tokio::test]
    async fn unknown_payment_id_mutates_nothing() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_unknown","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::UnknownTransaction);
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(student(&f.directory).await.subscription_status, SubscriptionStatus::Trial);
    }

    #[tokio::test]
    async fn failure_marks_pending_transaction_failed() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"FAILED"}"#))
            .await
            .unwrap();

        assert_eq!(result.outcome, ReconcileOutcome::MarkedFailed { transaction_id: id });
        assert_eq!(student(&f.directory).await.subscription_status, SubscriptionStatus::Trial);
    }

    #[tokio::test]
    async fn late_failure_never_reverts_success() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;

        f.handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();
        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"FAILED"}"#))
            .await
            .unwrap();

        assert_eq!(
            result.outcome,
            ReconcileOutcome::LateFailureIgnored { transaction_id: id }
        );
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Successful);
    }

    #[tokio::test]
    async fn success_after_failure_activates() {
        let f = fixture(MockPushNotifier::new());
        let id = seed_pending(&f.ledger, "pay_1").await;

        f.handler
            .handle(signed(r#"{"id":"pay_1","status":"FAILED"}"#))
            .await
            .unwrap();
        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        assert!(matches!(result.outcome, ReconcileOutcome::Activated { .. }));
        let tx = f.ledger.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Successful);
    }

    #[tokio::test]
    async fn other_status_is_informational() {
        let f = fixture(MockPushNotifier::new());
        seed_pending(&f.ledger, "pay_1").await;

        let result = f
            .handler
            .handle(signed(r#"{"id":"pay_1","status":"PENDING"}"#))
            .await
            .unwrap();

        assert!(matches!(
            result.outcome,
            ReconcileOutcome::Informational { ref status, .. } if status == "PENDING"
        ));
    }

    #[tokio::test]
    async fn concurrent_duplicate_deliveries_activate_once() {
        let f = fixture(MockPushNotifier::new());
        seed_pending(&f.ledger, "pay_1").await;
        let handler = Arc::new(f.handler);
        let body = r#"{"id":"pay_1","status":"SUCCESSFUL"}"#;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handler = Arc::clone(&handler);
            let cmd = signed(body);
            tasks.push(tokio::spawn(async move { handler.handle(cmd).await }));
        }

        let mut activations = 0;
        for task in tasks {
            let result = task.await.unwrap().unwrap();
            if let Some(confirmation) = result.confirmation {
                confirmation.await.unwrap();
            }
            if matches!(result.outcome, ReconcileOutcome::Activated { .. }) {
                activations += 1;
            }
        }

        assert_eq!(activations, 1);
        assert_eq!(f.notifier.sent_count(), 1);
    }
}
