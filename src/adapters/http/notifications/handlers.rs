//! HTTP handlers for notification endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAdmin;
use crate::application::handlers::notifications::{SendBroadcastCommand, SendBroadcastHandler};
use crate::ports::{AuditLog, PushNotifier, StudentDirectory};

#[derive(Clone)]
pub struct NotificationsAppState {
    pub directory: Arc<dyn StudentDirectory>,
    pub notifier: Arc<dyn PushNotifier>,
    pub audit_log: Arc<dyn AuditLog>,
}

impl NotificationsAppState {
    pub fn broadcast_handler(&self) -> SendBroadcastHandler {
        SendBroadcastHandler::new(
            self.directory.clone(),
            self.notifier.clone(),
            self.audit_log.clone(),
        )
    }
}

/// Admin broadcast request. `ALL` or an absent filter means everyone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub target_level: Option<String>,
    #[serde(default)]
    pub target_faculty_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub success: bool,
    /// Devices the notification was delivered to.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/notifications/broadcast - Push a notification to matching students
pub async fn send_broadcast(
    State(state): State<NotificationsAppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .broadcast_handler()
        .handle(SendBroadcastCommand {
            caller: admin,
            title: request.title,
            body: request.body,
            target_level: request.target_level,
            target_faculty_id: request.target_faculty_id,
        })
        .await?;

    let message = (result.recipient_count == 0 && result.failure_count == 0)
        .then(|| "No matching users found.".to_string());

    Ok(Json(BroadcastResponse {
        success: true,
        count: result.recipient_count,
        message,
    }))
}
