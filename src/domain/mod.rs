//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `billing` - Payment transactions, subscription renewal, webhook verification
//! - `identity` - Student identity records and matricule uniqueness key

pub mod billing;
pub mod foundation;
pub mod identity;
