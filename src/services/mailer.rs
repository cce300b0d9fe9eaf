use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Outbound mail. Only verification links are sent.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError>;
}

/// Writes the message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            from: format!("{} <{}>", config.from_name, config.from_email),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), MailError> {
        info!(from = %self.from, to, link, "verification email (not delivered, no transport configured)");
        Ok(())
    }
}

pub fn verification_link(base_url: &str, token: &str) -> String {
    format!("{}/api/auth/verify-email?token={}", base_url.trim_end_matches('/'), token)
}
