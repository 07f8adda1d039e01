use crate::config::MailgunConfig;
use crate::email::application::ports::outgoing::email_sender::{
    EmailSender, MailSendError, MessageId,
};
use async_trait::async_trait;
use email_address::EmailAddress;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct MailgunSendResponse {
    id: String,
    #[serde(default)]
    message: String,
}

/// Sends mail through the Mailgun HTTP API (`POST /{domain}/messages`).
pub struct MailgunEmailSender {
    client: reqwest::Client,
    messages_url: String,
    api_key: String,
    from_email: String,
    timeout: Duration,
}

impl MailgunEmailSender {
    pub fn new(
        config: &MailgunConfig,
        from_email: &str,
        timeout: Duration,
    ) -> Result<Self, MailSendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| MailSendError::Transport(e.to_string()))?;

        Ok(Self::new_with_client(client, config, from_email, timeout))
    }

    pub fn new_with_client(
        client: reqwest::Client,
        config: &MailgunConfig,
        from_email: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            messages_url: format!(
                "{}/{}/messages",
                config.api_base.trim_end_matches('/'),
                config.domain
            ),
            api_key: config.api_key.clone(),
            from_email: from_email.to_string(),
            timeout,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> MailSendError {
        if e.is_timeout() {
            MailSendError::Timeout(self.timeout)
        } else {
            MailSendError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl EmailSender for MailgunEmailSender {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageId, MailSendError> {
        // The "from" identity may carry a display name, so only the recipient is checked here.
        if !EmailAddress::is_valid(to) {
            return Err(MailSendError::InvalidAddress(to.to_string()));
        }

        let form = [
            ("from", self.from_email.as_str()),
            ("to", to),
            ("subject", subject),
            ("text", body),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailSendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let accepted: MailgunSendResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        tracing::debug!(message_id = %accepted.id, reply = %accepted.message, "Mailgun accepted message");

        Ok(MessageId::new(accepted.id))
    }
}
