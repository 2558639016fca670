//! Authentication types for the domain layer.
//!
//! These types represent an authenticated caller extracted from a bearer token.
//! They have no external dependencies; any identity provider can populate them
//! via the `SessionValidator` port.

use super::UserId;
use thiserror::Error;

/// Authenticated caller extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the identity provider.
    pub id: UserId,

    /// Email address from the token claims, if any.
    pub email: Option<String>,

    /// Whether the caller holds the privileged admin claim.
    pub is_admin: bool,
}

impl AuthenticatedUser {
    /// Creates a regular (non-privileged) user.
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            is_admin: false,
        }
    }

    /// Creates a privileged user.
    pub fn admin(id: UserId, email: Option<String>) -> Self {
        Self {
            id,
            email,
            is_admin: true,
        }
    }

    /// Returns the email, or the user id as fallback, for audit trails.
    pub fn audit_name(&self) -> &str {
        self.email.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// Caller is authenticated but lacks the privilege for this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
