//! Axum router configuration for notification endpoints.

use axum::{routing::post, Router};

use super::handlers::{send_broadcast, NotificationsAppState};

/// Create the notifications API router.
///
/// # Routes
///
/// ## Admin Endpoints
/// - `POST /notifications/broadcast` - Broadcast to a filtered audience
pub fn notification_routes() -> Router<NotificationsAppState> {
    Router::new().route("/notifications/broadcast", post(send_broadcast))
}
