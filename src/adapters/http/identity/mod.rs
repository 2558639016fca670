//! HTTP adapter for identity endpoints.
//!
//! - `POST /api/identity/created` - Matricule uniqueness guard trigger (admin)

pub mod handlers;
pub mod routes;

pub use handlers::{IdentityAppState, RecordCreatedRequest, RecordCreatedResponse};
pub use routes::identity_routes;
