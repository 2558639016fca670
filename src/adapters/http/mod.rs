//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure;
//! `router` assembles them behind the shared middleware.

pub mod billing;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod notifications;
pub mod router;

// Re-export key types for convenience
pub use billing::BillingAppState;
pub use error::{ApiError, ErrorResponse};
pub use identity::IdentityAppState;
pub use notifications::NotificationsAppState;
pub use router::{app_router, AppState, RouterSettings};
