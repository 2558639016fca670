//! Nkwa Pay adapter - mobile-money collection.
//!
//! - `NkwaPaymentAdapter` - HTTP client for the Nkwa Pay API
//! - `MockPaymentProvider` - in-memory provider for tests

mod mock_payment_provider;
mod nkwa_adapter;

pub use mock_payment_provider::MockPaymentProvider;
pub use nkwa_adapter::{
    NkwaConfig, NkwaEnvironment, NkwaPaymentAdapter, PRODUCTION_BASE_URL, SANDBOX_BASE_URL,
};
