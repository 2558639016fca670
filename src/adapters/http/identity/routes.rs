//! Axum router configuration for identity endpoints.

use axum::{routing::post, Router};

use super::handlers::{record_created, IdentityAppState};

/// Create the identity API router.
///
/// # Routes
///
/// ## Admin Endpoints
/// - `POST /identity/created` - Uniqueness guard trigger for a new student record
pub fn identity_routes() -> Router<IdentityAppState> {
    Router::new().route("/identity/created", post(record_created))
}
