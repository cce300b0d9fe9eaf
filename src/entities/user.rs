use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::fields::{self, MappingError};
use crate::repository::{TableEntity, Timestamps};
use crate::table::{Fields, Record};

pub const FIELD_EMAIL: &str = "Email";
pub const FIELD_PASSWORD: &str = "Password";
pub const FIELD_ROLE: &str = "Role";
pub const FIELD_STATUS: &str = "Status";
pub const FIELD_VERIFICATION_TOKEN: &str = "Email Verification Token";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    Admin,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("role must be one of 'Super Admin', 'Admin', 'User', got '{s}'"))
    }
}

/// `pending --verify--> active <--> disabled`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Pending,
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(UserStatus::Pending),
            "active" => Ok(UserStatus::Active),
            "disabled" => Ok(UserStatus::Disabled),
            other => Err(format!("status must be 'pending', 'active' or 'disabled', got '{other}'")),
        }
    }
}

/// Account record. The password hash and verification token never leave
/// the service in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub status: UserStatus,
    #[serde(skip_serializing, default)]
    pub email_verification_token: String,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl User {
    /// New pending account. `password` is the stored hash.
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            id: String::new(),
            email: email.into(),
            password: password.into(),
            role,
            status: UserStatus::Pending,
            email_verification_token: String::new(),
            timestamps: Timestamps::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

impl TableEntity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut Timestamps {
        &mut self.timestamps
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(FIELD_EMAIL.to_string(), Value::String(self.email.clone()));
        fields.insert(FIELD_PASSWORD.to_string(), Value::String(self.password.clone()));
        fields.insert(FIELD_ROLE.to_string(), Value::String(self.role.as_str().to_string()));
        fields.insert(FIELD_STATUS.to_string(), Value::String(self.status.as_str().to_string()));
        fields.insert(
            FIELD_VERIFICATION_TOKEN.to_string(),
            Value::String(self.email_verification_token.clone()),
        );
        self.timestamps.write(&mut fields);
        fields
    }

    fn from_record(record: &Record) -> Result<Self, MappingError> {
        let role = fields::choice(record, FIELD_ROLE)?;
        let role = if role.is_empty() {
            Role::default()
        } else {
            role.parse()
                .map_err(|_| MappingError::new(record, FIELD_ROLE, "a known role"))?
        };

        let status = fields::choice(record, FIELD_STATUS)?;
        let status = if status.is_empty() {
            UserStatus::default()
        } else {
            status
                .parse()
                .map_err(|_| MappingError::new(record, FIELD_STATUS, "a known status"))?
        };

        Ok(Self {
            id: record.id.clone(),
            email: fields::text(record, FIELD_EMAIL)?,
            password: fields::text(record, FIELD_PASSWORD)?,
            role,
            status,
            email_verification_token: fields::text(record, FIELD_VERIFICATION_TOKEN)?,
            timestamps: Timestamps::read(record),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::SuperAdmin).unwrap(), json!("Super Admin"));
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut user = User::new("alice@example.com", "$argon2id$hash", Role::User);
        user.email_verification_token = "abc".to_string();
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("email_verification_token").is_none());
        assert_eq!(value["role"], "User");
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn test_fields_round_trip() {
        let mut user = User::new("bob@example.com", "$argon2id$hash", Role::Admin);
        user.id = "rec9".to_string();
        user.status = UserStatus::Disabled;
        let record = Record::new("rec9", user.to_fields());
        assert_eq!(User::from_record(&record).unwrap(), user);
    }

    #[test]
    fn test_missing_role_and_status_default() {
        let fields: Fields = serde_json::from_value(json!({ "Email": "c@example.com" })).unwrap();
        let user = User::from_record(&Record::new("rec1", fields)).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.status, UserStatus::Pending);
    }

    #[test]
    fn test_unknown_role_fails_mapping() {
        let fields: Fields = serde_json::from_value(json!({ "Email": "c@example.com", "Role": "Owner" })).unwrap();
        assert!(User::from_record(&Record::new("rec1", fields)).is_err());
    }
}
