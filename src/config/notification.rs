//! Push notification configuration (Firebase Cloud Messaging)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// FCM settings. Push is disabled when neither field is set.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub fcm_project_id: Option<String>,

    /// OAuth2 access token for the FCM HTTP v1 API
    pub fcm_access_token: Option<String>,

    /// Overrides the FCM endpoint
    pub fcm_base_url: Option<String>,

    /// Bound on one confirmation push, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Project id and token, when push is configured.
    pub fn fcm_credentials(&self) -> Option<(&str, &str)> {
        match (&self.fcm_project_id, &self.fcm_access_token) {
            (Some(project), Some(token)) => Some((project.as_str(), token.as_str())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fcm_project_id.is_some() != self.fcm_access_token.is_some() {
            return Err(ValidationError::IncompleteFcmConfig);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            fcm_project_id: None,
            fcm_access_token: None,
            fcm_base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
