//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session token validation (HS256 JWT)
//! - `http` - Axum REST surface and provider webhook
//! - `memory` - In-memory stores for tests and database-less runs
//! - `nkwa` - Nkwa Pay mobile-money collection
//! - `postgres` - PostgreSQL stores
//! - `push` - Push notification delivery (FCM)

pub mod auth;
pub mod http;
pub mod memory;
pub mod nkwa;
pub mod postgres;
pub mod push;
