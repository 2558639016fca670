//! Nkwa Pay mobile-money adapter.
//!
//! Implements the `PaymentProvider` port against the Nkwa Pay REST API:
//! `POST {base}/collect` authenticated with the `X-API-Key` header.
//!
//! # Configuration
//!
//! ```ignore
//! let config = NkwaConfig::new(api_key, NkwaEnvironment::Sandbox)
//!     .with_timeout(Duration::from_secs(15));
//! let adapter = NkwaPaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::ProviderPaymentId;
use crate::ports::{CollectRequest, CollectedPayment, PaymentError, PaymentProvider};

pub const PRODUCTION_BASE_URL: &str = "https://api.pay.mynkwa.com";
pub const SANDBOX_BASE_URL: &str = "https://api.pay.staging.mynkwa.com";

/// Which Nkwa deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NkwaEnvironment {
    Sandbox,
    Production,
}

impl NkwaEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            NkwaEnvironment::Sandbox => SANDBOX_BASE_URL,
            NkwaEnvironment::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Nkwa API configuration.
#[derive(Clone)]
pub struct NkwaConfig {
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl NkwaConfig {
    pub fn new(api_key: impl Into<String>, environment: NkwaEnvironment) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: environment.base_url().to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Override the API base URL (local stubs, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound on the whole collection call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Payment object returned by Nkwa.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NkwaPayment {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NkwaErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Nkwa Pay adapter.
pub struct NkwaPaymentAdapter {
    config: NkwaConfig,
    http_client: reqwest::Client,
}

impl NkwaPaymentAdapter {
    pub fn new(config: NkwaConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> PaymentError {
        if e.is_timeout() {
            PaymentError::timeout(format!(
                "Nkwa collect timed out after {:?}",
                self.config.timeout
            ))
        } else {
            PaymentError::network(e.to_string())
        }
    }
}

#[async_trait]
impl PaymentProvider for NkwaPaymentAdapter {
    async fn collect(&self, request: CollectRequest) -> Result<CollectedPayment, PaymentError> {
        let url = format!("{}/collect", self.config.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("X-API-Key", self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let parsed: Option<NkwaErrorBody> = serde_json::from_str(&error_text).ok();
            let message = parsed
                .as_ref()
                .and_then(|b| b.message.clone())
                .unwrap_or_else(|| error_text.clone());
            tracing::error!(status = %status, error = %message, "Nkwa collect failed");

            let mut err = match status.as_u16() {
                401 | 403 => PaymentError::authentication(message),
                400..=499 => PaymentError::rejected(message),
                _ => PaymentError::provider(format!("Nkwa API error {}: {}", status, message)),
            };
            if let Some(code) = parsed.and_then(|b| b.code) {
                err = err.with_provider_code(code);
            }
            return Err(err);
        }

        let payment: NkwaPayment = response
            .json()
            .await
            .map_err(|e| PaymentError::provider(format!("Failed to parse Nkwa response: {}", e)))?;

        let id = ProviderPaymentId::new(payment.id)
            .map_err(|_| PaymentError::provider("Nkwa response carried an empty payment id"))?;

        Ok(CollectedPayment {
            id,
            status: payment.status,
        })
    }
}
