use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::entities::Role;
use crate::error::ApiError;

use super::auth::AuthUser;

pub const ADMIN_ROLES: &[Role] = &[Role::SuperAdmin, Role::Admin];
pub const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// Literal set of roles allowed through. There is no implied hierarchy:
/// list every role that may pass.
#[derive(Clone, Copy, Debug)]
pub struct RoleGuard(pub &'static [Role]);

impl RoleGuard {
    pub fn allows(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// Runs after [`super::jwt_auth_middleware`]; 403 when the request carries
/// no identity or its role is not in the guard's set.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::forbidden("Authentication required"))?;

    if !guard.allows(user.role) {
        tracing::debug!(user_id = %user.user_id, role = %user.role, "role check failed");
        return Err(ApiError::forbidden("Insufficient permissions"));
    }

    Ok(next.run(request).await)
}
