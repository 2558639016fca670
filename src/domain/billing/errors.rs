//! Billing error types for caller-facing operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | Forbidden | 403 |
//! | UserNotFound | 404 |
//! | PaymentInitiationFailed | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

/// Message returned to callers when the provider rejects or times out.
pub const PAYMENT_INITIATION_FAILED: &str = "Failed to initiate payment.";

/// Billing errors surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Caller input was rejected.
    ValidationFailed { field: String, message: String },

    /// Caller is authenticated but not allowed to do this.
    Forbidden,

    /// No identity record exists for this user.
    UserNotFound(UserId),

    /// The payment provider failed; detail is logged, not returned.
    PaymentInitiationFailed,

    /// Store or other infrastructure failure.
    Infrastructure(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::Forbidden => ErrorCode::Forbidden,
            BillingError::UserNotFound(_) => ErrorCode::UserNotFound,
            BillingError::PaymentInitiationFailed => ErrorCode::PaymentInitiationFailed,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a caller-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::Forbidden => "Admin privileges required".to_string(),
            BillingError::UserNotFound(user_id) => {
                format!("No profile found for user: {}", user_id)
            }
            BillingError::PaymentInitiationFailed => PAYMENT_INITIATION_FAILED.to_string(),
            BillingError::Infrastructure(_) => "Internal error".to_string(),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingError::Infrastructure(detail) => write!(f, "Infrastructure error: {}", detail),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for BillingError {}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                BillingError::validation(field, "must not be empty")
            }
            ValidationError::InvalidFormat { field, reason } => {
                BillingError::validation(field, reason)
            }
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => BillingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::Forbidden => BillingError::Forbidden,
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}
