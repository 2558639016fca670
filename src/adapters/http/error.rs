//! Error responses shared by the HTTP modules.
//!
//! Application errors are converted into `{code, message}` JSON bodies. Internal
//! detail never reaches the caller; it is logged instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::billing::BillingError;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// Error returned by the JSON API handlers.
#[derive(Debug)]
pub enum ApiError {
    Billing(BillingError),
    Domain(DomainError),
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Domain(err.into())
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::TransactionNotFound | ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidStateTransition | ErrorCode::DuplicateProviderPayment => {
            StatusCode::CONFLICT
        }
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::PaymentInitiationFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Billing(err) => {
                if let BillingError::Infrastructure(detail) = &err {
                    tracing::error!(error = %detail, "Billing request failed");
                }
                let code = err.code();
                let body = match &err {
                    BillingError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                        code.to_string(),
                        err.message(),
                        serde_json::json!({ "field": field }),
                    ),
                    _ => ErrorResponse::new(code.to_string(), err.message()),
                };
                (status_for(code), body)
            }
            ApiError::Domain(err) => {
                let status = status_for(err.code);
                let message = if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                    "Internal error".to_string()
                } else {
                    err.message.clone()
                };
                let body = match err.details.get("field") {
                    Some(field) if status == StatusCode::BAD_REQUEST => ErrorResponse::with_details(
                        err.code.to_string(),
                        message,
                        serde_json::json!({ "field": field }),
                    ),
                    _ => ErrorResponse::new(err.code.to_string(), message),
                };
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::TransactionStatus;
    use crate::domain::foundation::UserId;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn payment_failure_is_502_with_generic_message() {
        let response = ApiError::from(BillingError::PaymentInitiationFailed).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_of(response).await;
        assert_eq!(body.code, "PAYMENT_INITIATION_FAILED");
        assert_eq!(body.message, "Failed to initiate payment.");
    }

    #[tokio::test]
    async fn validation_failure_carries_field() {
        let response =
            ApiError::from(BillingError::validation("phone_number", "must not be empty"))
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(response).await;
        assert_eq!(body.details, Some(serde_json::json!({"field": "phone_number"})));
    }

    #[tokio::test]
    async fn infrastructure_detail_is_hidden() {
        let response =
            ApiError::from(BillingError::infrastructure("pool timed out")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.message, "Internal error");
    }

    #[tokio::test]
    async fn domain_database_error_is_hidden() {
        let response = ApiError::from(DomainError::database("relation users does not exist"))
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.message, "Internal error");
    }

    #[test]
    fn status_mapping_covers_caller_errors() {
        assert_eq!(
            ApiError::from(BillingError::UserNotFound(UserId::new("u").unwrap()))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::new(ErrorCode::Forbidden, "Admins only."))
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        let refused = TransactionStatus::Successful
            .ensure_transition(TransactionStatus::Failed)
            .unwrap_err();
        assert_eq!(ApiError::from(refused).into_response().status(), StatusCode::CONFLICT);
    }
}
