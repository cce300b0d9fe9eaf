// handlers/protected/users.rs - /api/users administration
//
// Admin and Super Admin: list, create, delete.
// Super Admin only: PUT (password, role, status).
// Any caller: change-password on their own id; Super Admin on any id.

use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::entities::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::services::{Accounts, UserUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    /// "Super Admin", "Admin" or "User"; defaults to "User".
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUserPasswordRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    pub new_password: String,
}

/// GET /api/users
pub async fn list_users(State(accounts): State<Accounts>) -> ApiResult<Vec<User>> {
    let users = accounts.list_users().await;
    Ok(ApiResponse::success(users).with_message("Users retrieved successfully"))
}

/// POST /api/users - accounts created here skip email verification
pub async fn create_user(
    State(accounts): State<Accounts>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> ApiResult<User> {
    let user = accounts
        .create_user(&payload.email, &payload.password, payload.role.as_deref())
        .await?;
    Ok(ApiResponse::created(user).with_message("User created successfully"))
}

/// PUT /api/users/:id
pub async fn update_user(
    State(accounts): State<Accounts>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let changes = UserUpdate {
        password: payload.password,
        role: payload.role,
        status: payload.status,
    };
    let user = accounts.update_user(&id, changes).await?;
    Ok(ApiResponse::success(user).with_message("User updated successfully"))
}

/// DELETE /api/users/:id
pub async fn delete_user(State(accounts): State<Accounts>, Path(id): Path<String>) -> ApiResult<()> {
    accounts.delete_user(&id).await?;
    Ok(ApiResponse::message_only("User deleted successfully"))
}

/// POST /api/users/:id/change-password
pub async fn change_user_password(
    State(accounts): State<Accounts>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<ChangeUserPasswordRequest>,
) -> ApiResult<()> {
    accounts
        .change_user_password(
            &auth.user_id,
            auth.role,
            &id,
            payload.old_password.as_deref(),
            &payload.new_password,
        )
        .await?;
    Ok(ApiResponse::message_only("Password changed successfully"))
}
