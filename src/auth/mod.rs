pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{Role, User};

pub use password::{generate_verification_token, hash_password, verify_password, PasswordError};

/// Signed token payload. Stateless: nothing is stored server side and
/// there is no revocation before `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Fails with [`TokenError::Signing`] when `now + ttl` is not a representable instant.
    pub fn new(user: &User, ttl: Duration) -> Result<Self, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("token lifetime out of range: {ttl}")))?;
        Ok(Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Issues an HS256 token for `user` valid for `ttl`.
pub fn generate_token(user: &User, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    encode_claims(&Claims::new(user, ttl)?, secret)
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verifies signature and expiry. A token is expired as soon as `now > exp`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserStatus;

    fn alice() -> User {
        let mut user = User::new("alice@example.com", "hash", Role::User);
        user.id = "rec42".to_string();
        user.status = UserStatus::Active;
        user
    }

    #[test]
    fn test_token_round_trip() {
        let token = generate_token(&alice(), "secret", Duration::hours(1)).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, "rec42");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = generate_token(&alice(), "secret", Duration::hours(1)).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let mut claims = Claims::new(&alice(), Duration::hours(1)).unwrap();
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 10;
        let token = encode_claims(&claims, "secret").unwrap();
        assert_eq!(validate_token(&token, "secret"), Err(TokenError::Expired));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_an_error() {
        assert!(matches!(
            generate_token(&alice(), "secret", Duration::try_days(100_000_000).unwrap()),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(validate_token("not.a.token", "secret"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            generate_token(&alice(), "", Duration::hours(1)),
            Err(TokenError::MissingSecret)
        );
    }
}
