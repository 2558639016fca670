//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    check_access, get_subscription, handle_payment_webhook, initiate_payment, list_payments,
    repair_subscriptions, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /subscriptions/initiate` - Start a subscription payment
/// - `GET /subscriptions/me` - Caller's subscription state
/// - `GET /subscriptions/access` - Access check
/// - `GET /payments` - Caller's transactions
///
/// ## Admin Endpoints
/// - `POST /admin/subscriptions/repair` - Repair sweep
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/subscriptions/initiate", post(initiate_payment))
        .route("/subscriptions/me", get(get_subscription))
        .route("/subscriptions/access", get(check_access))
        .route("/payments", get(list_payments))
        .route("/admin/subscriptions/repair", post(repair_subscriptions))
}

/// Create the provider webhook router.
///
/// Separate from the API routes because the provider carries no session;
/// requests are authenticated by signature only.
///
/// # Routes
/// - `POST /webhook` - Provider payment callback
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/webhook", post(handle_payment_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::http::middleware::{auth_middleware, AuthState};
    use crate::adapters::memory::{InMemoryStudentDirectory, InMemoryTransactionLedger};
    use crate::adapters::nkwa::MockPaymentProvider;
    use crate::adapters::push::MockPushNotifier;
    use crate::application::handlers::billing::{
        HandlePaymentWebhookHandler, InitiatePaymentHandler, SubscriptionPrice,
    };
    use crate::domain::billing::{
        sign_test_payload, signing_fixtures, SubscriptionStatus, TransactionStatus,
        WebhookVerifier,
    };
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::identity::{MatriculeKey, StudentProfile};
    use crate::ports::{PaymentError, StudentDirectory};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        ledger: Arc<InMemoryTransactionLedger>,
        directory: Arc<InMemoryStudentDirectory>,
        provider: MockPaymentProvider,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(InMemoryTransactionLedger::new());
        let directory = Arc::new(InMemoryStudentDirectory::with_profiles([
            StudentProfile::register(
                UserId::new("student-1").unwrap(),
                MatriculeKey::new("F1", "M1").unwrap(),
                Some("L1".to_string()),
                Timestamp::now().minus_days(10),
            ),
        ]));
        let provider = MockPaymentProvider::new().with_payment_id("pay_1");
        let verifier = WebhookVerifier::new(
            signing_fixtures::CALLBACK_URL,
            signing_fixtures::PROVIDER_PUBLIC_KEY,
        );

        let state = BillingAppState::new(
            ledger.clone(),
            directory.clone(),
            InitiatePaymentHandler::new(
                ledger.clone(),
                Arc::new(provider.clone()),
                SubscriptionPrice::default(),
            ),
            HandlePaymentWebhookHandler::new(
                verifier,
                ledger.clone(),
                directory.clone(),
                Arc::new(MockPushNotifier::new()),
            ),
        );

        let validator: AuthState = Arc::new(
            MockSessionValidator::new()
                .with_test_user("student-token", "student-1")
                .with_test_user("stranger-token", "stranger")
                .with_test_admin("admin-token", "ops"),
        );

        let api = billing_routes()
            .layer(middleware::from_fn_with_state(validator, auth_middleware))
            .with_state(state.clone());
        let app = Router::new()
            .nest("/api", api)
            .merge(webhook_routes().with_state(state));

        Harness {
            app,
            ledger,
            directory,
            provider,
        }
    }

    fn authed(method: &str, uri: &str, token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap()
    }

    fn signed_webhook(body: &str) -> Request<Body> {
        let timestamp = "1717243200";
        let signature = sign_test_payload(
            signing_fixtures::PROVIDER_PRIVATE_KEY,
            timestamp,
            signing_fixtures::CALLBACK_URL,
            body.as_bytes(),
        );
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("X-Signature", signature)
            .header("X-Timestamp", timestamp)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Initiation
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn initiate_returns_provider_payment_id() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed(
                "POST",
                "/api/subscriptions/initiate",
                "student-token",
                Body::from(r#"{"phoneNumber":"670000000"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["paymentId"], "pay_1");
        assert_eq!(h.ledger.all().len(), 1);
        assert_eq!(h.ledger.all()[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn initiate_without_token_is_unauthenticated() {
        let h = harness();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/subscriptions/initiate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"phoneNumber":"670000000"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(h.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn initiate_with_blank_phone_is_bad_request() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed(
                "POST",
                "/api/subscriptions/initiate",
                "student-token",
                Body::from(r#"{"phoneNumber":"   "}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway_with_generic_message() {
        let h = harness();
        h.provider.fail_next(PaymentError::provider("insufficient funds"));

        let response = h
            .app
            .oneshot(authed(
                "POST",
                "/api/subscriptions/initiate",
                "student-token",
                Body::from(r#"{"phoneNumber":"670000000"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Failed to initiate payment.");
        assert!(!body.to_string().contains("insufficient"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_success_webhook_activates_subscription() {
        let h = harness();
        let initiate = authed(
            "POST",
            "/api/subscriptions/initiate",
            "student-token",
            Body::from(r#"{"phoneNumber":"670000000"}"#),
        );
        h.app.clone().oneshot(initiate).await.unwrap();

        let response = h
            .app
            .oneshot(signed_webhook(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_body(response).await, "Processed");
        let profile = h
            .directory
            .find_by_id(&UserId::new("student-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn webhook_without_signature_is_bad_request() {
        let h = harness();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .body(Body::from(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text_body(response).await, "Missing Headers");
    }

    #[tokio::test]
    async fn webhook_with_tampered_body_is_unauthorized() {
        let h = harness();
        let mut request = signed_webhook(r#"{"id":"pay_1","status":"FAILED"}"#);
        *request.body_mut() = Body::from(r#"{"id":"pay_1","status":"SUCCESSFUL"}"#);

        let response = h.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(text_body(response).await, "Invalid Signature");
    }

    #[tokio::test]
    async fn webhook_for_unknown_payment_is_acknowledged() {
        let h = harness();

        let response = h
            .app
            .oneshot(signed_webhook(r#"{"id":"never-issued","status":"SUCCESSFUL"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_view_reports_trial_access() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed("GET", "/api/subscriptions/me", "student-token", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "trial");
        assert_eq!(body["hasAccess"], true);
    }

    #[tokio::test]
    async fn subscription_view_for_unknown_user_is_not_found() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed("GET", "/api/subscriptions/me", "stranger-token", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn access_check_grants_admin() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed("GET", "/api/subscriptions/access", "admin-token", Body::empty()))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["hasAccess"], true);
        assert_eq!(body["basis"], "admin");
    }

    #[tokio::test]
    async fn payments_lists_only_callers_transactions() {
        let h = harness();
        h.app
            .clone()
            .oneshot(authed(
                "POST",
                "/api/subscriptions/initiate",
                "student-token",
                Body::from(r#"{"phoneNumber":"670000000"}"#),
            ))
            .await
            .unwrap();

        let mine = json_body(
            h.app
                .clone()
                .oneshot(authed("GET", "/api/payments", "student-token", Body::empty()))
                .await
                .unwrap(),
        )
        .await;
        let theirs = json_body(
            h.app
                .oneshot(authed("GET", "/api/payments", "stranger-token", Body::empty()))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(mine["payments"].as_array().unwrap().len(), 1);
        assert!(theirs["payments"].as_array().unwrap().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Admin
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn repair_requires_admin() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed(
                "POST",
                "/api/admin/subscriptions/repair",
                "student-token",
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn repair_runs_for_admin_without_body() {
        let h = harness();

        let response = h
            .app
            .oneshot(authed(
                "POST",
                "/api/admin/subscriptions/repair",
                "admin-token",
                Body::empty(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["scanned"], 0);
    }
}
