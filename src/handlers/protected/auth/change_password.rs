// handlers/protected/auth/change_password.rs - POST /api/auth/change-password handler

use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::services::Accounts;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password - change the caller's own password
///
/// 401 `INVALID_AUTH` when `old_password` is wrong; 400 when the new one is
/// too short or equal to the old one.
pub async fn change_password_post(
    State(accounts): State<Accounts>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(payload): ValidJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    accounts
        .change_own_password(&auth.user_id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::message_only("Password changed successfully"))
}
