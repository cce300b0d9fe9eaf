// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::{Accounts, TokenResponse};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// ```json
/// { "access_token": "eyJ...", "token_type": "Bearer", "expires_in": 86400, "user": { ... } }
/// ```
///
/// 401 `INVALID_AUTH` for unknown email or wrong password, 403 for pending
/// or disabled accounts.
pub async fn login_post(
    State(accounts): State<Accounts>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = accounts.login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::success(token).with_message("Login successful"))
}
