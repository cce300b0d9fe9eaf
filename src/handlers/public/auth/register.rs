// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;
use serde::Deserialize;

use crate::entities::User;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::services::Accounts;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register - create a pending `User` account
///
/// Returns 201 with the account (no password or token), 409
/// `DUPLICATE_EMAIL` when the address is taken, 400 for a short password.
pub async fn register_post(
    State(accounts): State<Accounts>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<User> {
    let user = accounts.register(&payload.email, &payload.password).await?;

    Ok(ApiResponse::created(user)
        .with_message("User registered successfully. Please check your email to verify your account"))
}
