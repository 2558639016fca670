//! Firebase Cloud Messaging adapter.
//!
//! Sends one HTTP v1 `messages:send` request per device token. The OAuth access
//! token is supplied through configuration and refreshed outside the process.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::ports::{NotificationError, PushMessage, PushNotifier};

pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// FCM configuration.
#[derive(Clone)]
pub struct FcmConfig {
    project_id: String,
    access_token: SecretString,
    base_url: String,
    timeout: Duration,
}

impl FcmConfig {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            access_token: SecretString::new(access_token.into()),
            base_url: FCM_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.base_url, self.project_id
        )
    }
}

/// `PushNotifier` backed by FCM HTTP v1.
pub struct FcmNotifier {
    config: FcmConfig,
    http_client: reqwest::Client,
}

impl FcmNotifier {
    pub fn new(config: FcmConfig) -> Result<Self, NotificationError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                NotificationError::Transport(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn send(&self, message: &PushMessage) -> Result<(), NotificationError> {
        let payload = json!({
            "message": {
                "token": message.token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "android": { "priority": "high" },
            }
        });

        let response = self
            .http_client
            .post(self.config.send_url())
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout
                } else {
                    NotificationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, error = %error_text, "FCM send failed");

        if status.is_client_error() {
            Err(NotificationError::Rejected(format!("{}: {}", status, error_text)))
        } else {
            Err(NotificationError::Transport(format!("{}: {}", status, error_text)))
        }
    }
}
