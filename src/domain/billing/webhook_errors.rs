//! Webhook error types for provider payment notifications.
//!
//! Every error maps to the HTTP status returned to the provider. Anything the
//! provider should not retry is a 4xx; configuration and storage failures are 5xx.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while authenticating or processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A required signature header was absent.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// The signature does not match the canonical payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The configured public key could not be loaded.
    #[error("Verification key error: {0}")]
    KeyError(String),

    /// The signature header is not valid base64.
    #[error("Malformed signature encoding: {0}")]
    SignatureEncoding(String),

    /// Failed to parse the authenticated payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Ledger or directory operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// Verification exceptions are 500 so that a broken key is
    /// distinguishable from a forged request (401).
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingHeader(_)
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::KeyError(_)
            | WebhookError::SignatureEncoding(_)
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text returned to the provider; never includes internal detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            WebhookError::MissingHeader(_) => "Missing Headers",
            WebhookError::InvalidSignature => "Invalid Signature",
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => "Invalid Payload",
            WebhookError::KeyError(_) | WebhookError::SignatureEncoding(_) => {
                "Signature Verification Error"
            }
            WebhookError::Database(_) => "Internal Error",
        }
    }
}
