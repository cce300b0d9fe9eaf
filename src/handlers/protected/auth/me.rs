// handlers/protected/auth/me.rs - GET /api/auth/me handler

use axum::extract::{Extension, State};

use crate::entities::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::Accounts;

/// GET /api/auth/me - current account as stored, not just the token claims
pub async fn me_get(State(accounts): State<Accounts>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let user = accounts.get_user(&auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
