use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{self, generate_verification_token, hash_password, verify_password, PasswordError, TokenError};
use crate::config::{AuthConfig, EmailConfig};
use crate::entities::user::{FIELD_EMAIL, FIELD_VERIFICATION_TOKEN};
use crate::entities::{Role, User, UserStatus};
use crate::repository::SharedRepository;

use super::mailer::{verification_link, Mailer};
use super::ServiceError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Successful login payload.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified(User),
    AlreadyVerified(User),
}

/// Super admin changes to another account. At least one must be set.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Registration, verification, login and administration of user accounts.
///
/// Email uniqueness is a lookup followed by a create with no lock in
/// between; two concurrent registrations of one address can both succeed.
#[derive(Clone)]
pub struct Accounts {
    users: SharedRepository<User>,
    auth: AuthConfig,
    email: EmailConfig,
    mailer: Arc<dyn Mailer>,
}

impl Accounts {
    pub fn new(users: SharedRepository<User>, auth: AuthConfig, email: EmailConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users,
            auth,
            email,
            mailer,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.users.list().await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ServiceError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let email = normalize_email(email);
        Ok(self.users.find_by(FIELD_EMAIL, &email).await?.into_iter().next())
    }

    /// Creates a pending `User` account and mails its verification link.
    /// A failed send is logged; the account still exists.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let created = self.create_pending(email, password, Role::User).await?;
        info!(user_id = %created.id, email = %created.email, "user registered");
        Ok(created)
    }

    /// Exchanges a one-time token: `pending` becomes `active` and the token is cleared.
    pub async fn verify_email(&self, token: &str) -> Result<VerifyOutcome, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::validation("Verification token is required"));
        }

        let user = self
            .users
            .find_by(FIELD_VERIFICATION_TOKEN, token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound("Verification token".to_string()))?;

        match user.status {
            UserStatus::Active => Ok(VerifyOutcome::AlreadyVerified(user)),
            UserStatus::Disabled => Err(ServiceError::Forbidden("Account is disabled".to_string())),
            UserStatus::Pending => {
                let mut verified = user.clone();
                verified.status = UserStatus::Active;
                verified.email_verification_token.clear();

                let updated = self
                    .users
                    .update(&user.id, verified)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;
                info!(user_id = %updated.id, "email verified");
                Ok(VerifyOutcome::Verified(updated))
            }
        }
    }

    /// The password is checked before the account status, so a wrong
    /// password never reveals whether an account is pending or disabled.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ServiceError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !password_matches(password, &user).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        match user.status {
            UserStatus::Active => {}
            UserStatus::Disabled => return Err(ServiceError::Forbidden("Account is disabled".to_string())),
            UserStatus::Pending => {
                return Err(ServiceError::Forbidden(
                    "Email not verified. Please check your inbox for the verification link".to_string(),
                ))
            }
        }

        let ttl = self
            .auth
            .token_ttl()
            .ok_or_else(|| {
                TokenError::Signing(format!(
                    "token expiry of {} hours is out of range",
                    self.auth.token_expiry_hours
                ))
            })?;
        let access_token = auth::generate_token(&user, &self.auth.jwt_secret, ttl)?;
        info!(user_id = %user.id, "user logged in");

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: ttl.num_seconds(),
            user,
        })
    }

    /// Admin-created accounts start `pending` and get the same verification
    /// mail as self-registered ones.
    pub async fn create_user(&self, email: &str, password: &str, role: Option<&str>) -> Result<User, ServiceError> {
        let role = match role {
            Some(role) => parse_role(role)?,
            None => Role::User,
        };

        let created = self.create_pending(email, password, role).await?;
        info!(user_id = %created.id, role = %created.role, "user created");
        Ok(created)
    }

    /// Status may only be set to `active` or `disabled`.
    pub async fn update_user(&self, id: &str, changes: UserUpdate) -> Result<User, ServiceError> {
        if changes.password.is_none() && changes.role.is_none() && changes.status.is_none() {
            return Err(ServiceError::validation(
                "At least one field (password, role, status) must be provided",
            ));
        }

        let mut user = self.get_user(id).await?;

        if let Some(role) = changes.role {
            user.role = parse_role(&role)?;
        }

        if let Some(status) = changes.status {
            user.status = match status.parse::<UserStatus>() {
                Ok(status @ (UserStatus::Active | UserStatus::Disabled)) => status,
                _ => {
                    return Err(ServiceError::invalid_field(
                        "status",
                        "must be 'active' or 'disabled'",
                    ))
                }
            };
        }

        if let Some(password) = changes.password {
            validate_password(&password)?;
            user.password = hash_password(&password, self.auth.password).await?;
        }

        let updated = self
            .users
            .update(id, user)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;
        info!(user_id = %updated.id, role = %updated.role, status = %updated.status, "user updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        if self.users.delete(id).await? {
            info!(user_id = id, "user deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound("User".to_string()))
        }
    }

    pub async fn change_own_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let user = self.get_user(user_id).await?;
        if !password_matches(old_password, &user).await? {
            return Err(ServiceError::InvalidCredentials);
        }
        if old_password == new_password {
            return Err(ServiceError::invalid_field(
                "new_password",
                "must differ from the current password",
            ));
        }
        self.set_password(user, new_password).await
    }

    /// A super admin may reset anyone's password without the old one.
    /// Everyone else may only change their own, and must supply the old one.
    pub async fn change_user_password(
        &self,
        actor_id: &str,
        actor_role: Role,
        target_id: &str,
        old_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if actor_role == Role::SuperAdmin {
            let user = self.get_user(target_id).await?;
            return self.set_password(user, new_password).await;
        }

        if actor_id != target_id {
            return Err(ServiceError::Forbidden(
                "You can only change your own password".to_string(),
            ));
        }

        match old_password {
            Some(old) if !old.is_empty() => self.change_own_password(target_id, old, new_password).await,
            _ => Err(ServiceError::invalid_field("old_password", "is required")),
        }
    }

    /// Creates `email` as an active super admin unless that account exists.
    pub async fn bootstrap_super_admin(&self, email: &str, password: &str) -> Result<Option<User>, ServiceError> {
        if self.find_by_email(email).await?.is_some() {
            return Ok(None);
        }
        let mut user = self.new_account(email, password, Role::SuperAdmin).await?;
        user.status = UserStatus::Active;
        let created = self.users.create(user).await?;
        info!(email = %created.email, "bootstrap super admin created");
        Ok(Some(created))
    }

    /// Validated, not yet stored account with a hashed password.
    async fn new_account(&self, email: &str, password: &str, role: Role) -> Result<User, ServiceError> {
        let email = validate_email(email)?;
        validate_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let hash = hash_password(password, self.auth.password).await?;
        Ok(User::new(email, hash, role))
    }

    async fn create_pending(&self, email: &str, password: &str, role: Role) -> Result<User, ServiceError> {
        let mut user = self.new_account(email, password, role).await?;
        user.email_verification_token = generate_verification_token();

        let created = self.users.create(user).await?;

        let link = verification_link(&self.email.base_url, &created.email_verification_token);
        if let Err(e) = self.mailer.send_verification(&created.email, &link).await {
            warn!(email = %created.email, error = %e, "failed to send verification email");
        }

        Ok(created)
    }

    async fn set_password(&self, mut user: User, new_password: &str) -> Result<(), ServiceError> {
        validate_password(new_password)?;
        user.password = hash_password(new_password, self.auth.password).await?;
        let id = user.id.clone();
        self.users
            .update(&id, user)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User".to_string()))?;
        info!(user_id = %id, "password changed");
        Ok(())
    }
}

/// A stored hash that does not parse counts as a mismatch.
async fn password_matches(password: &str, user: &User) -> Result<bool, ServiceError> {
    match verify_password(password, &user.password).await {
        Ok(matches) => Ok(matches),
        Err(PasswordError::MalformedHash(e)) => {
            warn!(user_id = %user.id, error = %e, "stored password hash is malformed");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = normalize_email(email);
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(ServiceError::invalid_field("email", "must be a valid email address"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid_field(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role, ServiceError> {
    role.parse()
        .map_err(|problem: String| ServiceError::invalid_field("role", problem))
}
