use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Identifier the mail provider assigned to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailSendError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail provider did not respond within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hands one message to the provider. `Ok` means the provider accepted it,
    /// not that it reached the inbox.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageId, MailSendError>;
}
