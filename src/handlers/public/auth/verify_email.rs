// handlers/public/auth/verify_email.rs - GET /api/auth/verify-email?token= handler

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::entities::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Accounts, VerifyOutcome};

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

/// GET /api/auth/verify-email - activate a pending account
pub async fn verify_email_get(
    State(accounts): State<Accounts>,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<User> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Verification token is required"))?;

    match accounts.verify_email(&token).await? {
        VerifyOutcome::Verified(user) => {
            Ok(ApiResponse::success(user).with_message("Email verified successfully. You can now log in"))
        }
        VerifyOutcome::AlreadyVerified(user) => Ok(ApiResponse::success(user).with_message("Email already verified")),
    }
}
