//! HTTP adapter for notification endpoints.
//!
//! - `POST /api/notifications/broadcast` - Admin broadcast

pub mod handlers;
pub mod routes;

pub use handlers::{BroadcastRequest, BroadcastResponse, NotificationsAppState};
pub use routes::notification_routes;
