use crate::email::application::ports::outgoing::MessageId;
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use std::str::FromStr;
use uuid::Uuid;

/// Decoded event payload, exactly as it arrived. Nothing is checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("email is missing")]
    MissingEmail,

    #[error("email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("token is missing")]
    MissingToken,

    #[error("token '{0}' is not a UUID")]
    InvalidToken(String),
}

/// A request whose recipient and token have both been checked.
#[derive(Debug, Clone)]
pub struct VerificationTarget {
    pub email: EmailAddress,
    pub token: Uuid,
}

impl VerificationRequest {
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn validate(&self) -> Result<VerificationTarget, InvalidRequest> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(InvalidRequest::MissingEmail);
        }
        let email = EmailAddress::from_str(email)
            .map_err(|_| InvalidRequest::InvalidEmail(self.email.clone()))?;

        let token = self.token.trim();
        if token.is_empty() {
            return Err(InvalidRequest::MissingToken);
        }
        let token =
            Uuid::parse_str(token).map_err(|_| InvalidRequest::InvalidToken(self.token.clone()))?;

        Ok(VerificationTarget { email, token })
    }
}

/// The slice of a user row this service reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserVerificationRecord {
    pub id: Uuid,
    pub verification_token: Uuid,
    pub verification_link_expiry_timestamp: DateTime<Utc>,
    pub user_verification_status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub message_id: MessageId,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
