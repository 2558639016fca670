//! HTTP adapter for billing endpoints.
//!
//! Exposes the payment and subscription flows via REST API:
//! - `POST /webhook` - Provider payment callback (signature only)
//! - `POST /api/subscriptions/initiate` - Start a subscription payment
//! - `GET /api/subscriptions/me` - Caller's subscription
//! - `GET /api/subscriptions/access` - Access check
//! - `GET /api/payments` - Caller's transactions
//! - `POST /api/admin/subscriptions/repair` - Repair sweep (admin)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{BillingAppState, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use routes::{billing_routes, webhook_routes};
