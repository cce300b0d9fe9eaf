pub mod auth;
pub mod json;
pub mod response;
pub mod role;

pub use auth::{jwt_auth_middleware, AuthUser, JwtSecret};
pub use json::ValidJson;
pub use response::{ApiResponse, ApiResult};
pub use role::{require_role, RoleGuard, ADMIN_ROLES, SUPER_ADMIN_ONLY};
