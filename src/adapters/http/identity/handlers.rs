//! HTTP handlers for identity endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::RequireAdmin;
use crate::application::handlers::identity::{
    EnforceMatriculeUniquenessCommand, EnforceMatriculeUniquenessHandler,
    EnforceMatriculeUniquenessResult,
};
use crate::domain::foundation::UserId;

/// Shared state for identity routes.
///
/// The uniqueness handler owns the per-key lock table, so it is built once
/// and shared by every request.
#[derive(Clone)]
pub struct IdentityAppState {
    pub uniqueness_guard: Arc<EnforceMatriculeUniquenessHandler>,
}

impl IdentityAppState {
    pub fn new(uniqueness_guard: EnforceMatriculeUniquenessHandler) -> Self {
        Self {
            uniqueness_guard: Arc::new(uniqueness_guard),
        }
    }
}

/// Notification that a student record was created.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreatedRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreatedResponse {
    /// `record_gone`, `unique`, `duplicate_removed` or `kept_as_earliest`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survivor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<usize>,
}

impl From<EnforceMatriculeUniquenessResult> for RecordCreatedResponse {
    fn from(result: EnforceMatriculeUniquenessResult) -> Self {
        let (outcome, survivor_id, duplicates) = match result {
            EnforceMatriculeUniquenessResult::RecordGone => ("record_gone", None, None),
            EnforceMatriculeUniquenessResult::Unique => ("unique", None, None),
            EnforceMatriculeUniquenessResult::DuplicateRemoved { survivor } => {
                ("duplicate_removed", Some(survivor.to_string()), None)
            }
            EnforceMatriculeUniquenessResult::KeptAsEarliest { duplicates } => {
                ("kept_as_earliest", None, Some(duplicates))
            }
        };
        Self {
            outcome: outcome.to_string(),
            survivor_id,
            duplicates,
        }
    }
}

/// POST /api/identity/created - Run the matricule uniqueness guard for a new record
pub async fn record_created(
    State(state): State<IdentityAppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(request): Json<RecordCreatedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(request.user_id)?;

    let result = state
        .uniqueness_guard
        .handle(EnforceMatriculeUniquenessCommand { user_id })
        .await?;

    Ok(Json(RecordCreatedResponse::from(result)))
}
