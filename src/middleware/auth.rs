use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_token, Claims};
use crate::entities::Role;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// HS256 secret the middleware validates against.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
///
/// Rejects with 401 `UNAUTHORIZED` when the header is missing, `INVALID_TOKEN`
/// when it is malformed or fails verification, and `EXPIRED_TOKEN` past `exp`.
pub async fn jwt_auth_middleware(
    State(secret): State<JwtSecret>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers())?;
    let claims = validate_token(&token, &secret.0)?;

    // Convert claims to AuthUser and inject into request
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Authorization header required"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::invalid_token("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(ApiError::invalid_token("Empty bearer token")),
        None => Err(ApiError::invalid_token(
            "Authorization header must use Bearer token format",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        let err = extract_jwt_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_wrong_scheme() {
        let err = extract_jwt_from_headers(&headers("Basic abc")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TOKEN");
        let err = extract_jwt_from_headers(&headers("Bearer ")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TOKEN");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }
}
