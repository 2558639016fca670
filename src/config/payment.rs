//! Payment configuration (Nkwa Pay and webhook verification)

use serde::Deserialize;
use std::time::Duration;

use super::error::{ConfigError, ValidationError};

/// Which Nkwa deployment to call.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderEnvironment {
    #[default]
    Sandbox,
    Production,
}

/// Payment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Nkwa Pay API key
    pub nkwa_api_key: String,

    #[serde(default)]
    pub environment: ProviderEnvironment,

    /// Overrides the environment's base URL
    pub base_url: Option<String>,

    /// Bound on one collection call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Subscription price in minor units
    #[serde(default = "default_amount")]
    pub amount: i64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Public URL of `POST /webhook`; part of the signed payload
    pub webhook_callback_url: String,

    /// Provider RSA public key, PEM text
    pub webhook_public_key: Option<String>,

    /// Path to the provider RSA public key, used when the PEM is not inline
    pub webhook_public_key_path: Option<String>,
}

impl PaymentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the provider public key, reading it from disk if configured by path.
    pub fn webhook_public_key_pem(&self) -> Result<String, ConfigError> {
        if let Some(pem) = self.webhook_public_key.as_ref().filter(|p| !p.trim().is_empty()) {
            return Ok(pem.replace("\\n", "\n"));
        }
        let path = self
            .webhook_public_key_path
            .as_ref()
            .ok_or(ValidationError::MissingRequired("PAYMENT__WEBHOOK_PUBLIC_KEY"))?;
        let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        if !pem.contains("-----BEGIN") {
            return Err(ValidationError::InvalidPublicKey.into());
        }
        Ok(pem)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.nkwa_api_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__NKWA_API_KEY"));
        }
        if self.amount <= 0 {
            return Err(ValidationError::InvalidAmount);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        let url = self.webhook_callback_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ValidationError::InvalidCallbackUrl);
        }
        match &self.webhook_public_key {
            Some(pem) if !pem.trim().is_empty() => {
                if !pem.contains("-----BEGIN") {
                    return Err(ValidationError::InvalidPublicKey);
                }
            }
            _ if self.webhook_public_key_path.is_none() => {
                return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_PUBLIC_KEY"));
            }
            _ => {}
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    15
}

fn default_amount() -> i64 {
    399
}

fn default_currency() -> String {
    "XAF".to_string()
}
