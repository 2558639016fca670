//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{RequireAdmin, RequireAuth};
use crate::application::handlers::billing::{
    CheckAccessHandler, CheckAccessQuery, GetSubscriptionHandler, GetSubscriptionQuery,
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, InitiatePaymentCommand,
    InitiatePaymentHandler, ListPaymentsHandler, ListPaymentsQuery, RepairSubscriptionsCommand,
    RepairSubscriptionsHandler,
};
use crate::ports::{StudentDirectory, TransactionLedger};

use super::dto::{
    AccessCheckResponse, InitiatePaymentRequest, InitiatePaymentResponse, PaymentListResponse,
    PaymentResponse, RepairSubscriptionsRequest, RepairSubscriptionsResponse,
    SubscriptionResponse, WEBHOOK_PROCESSED,
};

/// Header carrying the provider's base64 RS256 signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Header carrying the provider's signing timestamp.
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for billing routes.
///
/// Handlers that carry configuration (price, verification key, timeouts) are
/// built once at startup; stateless query handlers are created per request.
#[derive(Clone)]
pub struct BillingAppState {
    pub ledger: Arc<dyn TransactionLedger>,
    pub directory: Arc<dyn StudentDirectory>,
    pub initiate_payment: Arc<InitiatePaymentHandler>,
    pub payment_webhook: Arc<HandlePaymentWebhookHandler>,
}

impl BillingAppState {
    pub fn new(
        ledger: Arc<dyn TransactionLedger>,
        directory: Arc<dyn StudentDirectory>,
        initiate_payment: InitiatePaymentHandler,
        payment_webhook: HandlePaymentWebhookHandler,
    ) -> Self {
        Self {
            ledger,
            directory,
            initiate_payment: Arc::new(initiate_payment),
            payment_webhook: Arc::new(payment_webhook),
        }
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.directory.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.directory.clone())
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.ledger.clone())
    }

    pub fn repair_handler(&self) -> RepairSubscriptionsHandler {
        RepairSubscriptionsHandler::new(self.ledger.clone(), self.directory.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Provider Webhook
// ════════════════════════════════════════════════════════════════════════════════

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// POST /webhook - Provider payment callback.
///
/// The body is taken raw; the signature covers the exact bytes received.
pub async fn handle_payment_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let cmd = HandlePaymentWebhookCommand {
        raw_body: body.to_vec(),
        signature: header_value(&headers, SIGNATURE_HEADER),
        timestamp: header_value(&headers, TIMESTAMP_HEADER),
    };

    match state.payment_webhook.handle(cmd).await {
        Ok(result) => {
            tracing::debug!(outcome = ?result.outcome, "Payment webhook processed");
            (StatusCode::OK, WEBHOOK_PROCESSED).into_response()
        }
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                tracing::error!(error = %e, "Payment webhook failed");
            }
            (status, e.public_message()).into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscriptions/me - Caller's subscription state
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery { user_id: user.id })
        .await?;

    Ok(Json(SubscriptionResponse::from(view)))
}

/// GET /api/subscriptions/access - Whether the caller may read subscriber material
pub async fn check_access(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .check_access_handler()
        .handle(CheckAccessQuery { user })
        .await?;

    Ok(Json(AccessCheckResponse::from(result)))
}

/// GET /api/payments - Caller's transactions, newest first
pub async fn list_payments(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .list_payments_handler()
        .handle(ListPaymentsQuery { user_id: user.id })
        .await?;

    Ok(Json(PaymentListResponse {
        payments: result
            .transactions
            .into_iter()
            .map(PaymentResponse::from)
            .collect(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscriptions/initiate - Start a mobile money collection
pub async fn initiate_payment(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .initiate_payment
        .handle(InitiatePaymentCommand {
            user_id: user.id,
            phone_number: request.phone_number,
        })
        .await?;

    Ok((StatusCode::OK, Json(InitiatePaymentResponse::from(result))))
}

/// POST /api/admin/subscriptions/repair - Re-apply renewals lost to a crash
pub async fn repair_subscriptions(
    State(state): State<BillingAppState>,
    RequireAdmin(admin): RequireAdmin,
    request: Option<Json<RepairSubscriptionsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut cmd = RepairSubscriptionsCommand::default();
    if let Some(window_days) = request.and_then(|Json(r)| r.window_days) {
        cmd.window_days = window_days;
    }

    tracing::info!(admin = %admin.id, window_days = cmd.window_days, "Repair sweep requested");
    let result = state.repair_handler().handle(cmd).await?;

    Ok(Json(RepairSubscriptionsResponse::from(result)))
}
