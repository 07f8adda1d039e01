use crate::email::application::ports::outgoing::email_sender::{
    EmailSender, MailSendError, MessageId,
};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    message::header::ContentType, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Message) -> Result<(), String>;
}

pub struct SmtpEmailSender {
    mailer: Box<dyn Mailer>,
    from_email: String,
}

#[async_trait]
impl Mailer for AsyncSmtpTransport<Tokio1Executor> {
    async fn send(&self, email: Message) -> Result<(), String> {
        AsyncTransport::send(self, email)
            .await
            .map(|_resp| ())
            .map_err(|e| e.to_string())
    }
}

impl SmtpEmailSender {
    pub fn new_with_mailer(mailer: Box<dyn Mailer>, from_email: &str) -> Self {
        Self {
            mailer,
            from_email: from_email.to_string(),
        }
    }

    pub fn new(
        smtp_server: &str,
        smtp_port: u16,
        smtp_username: &str,
        smtp_password: &str,
        from_email: &str,
    ) -> Result<Self, MailSendError> {
        let creds = Credentials::new(smtp_username.to_string(), smtp_password.to_string());

        let builder = if uses_implicit_tls(smtp_port) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_server)
        };

        let transport = builder
            .map_err(|e| MailSendError::Transport(e.to_string()))?
            .port(smtp_port)
            .credentials(creds)
            .build();

        Ok(Self::new_with_mailer(Box::new(transport), from_email))
    }

    // Local/test constructor (Mailpit, MailHog, etc.)
    pub fn new_local(host: &str, port: u16, from_email: &str) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self::new_with_mailer(Box::new(transport), from_email)
    }
}

/// SMTPS port; every other port starts in plaintext and upgrades with STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

fn uses_implicit_tls(port: u16) -> bool {
    port == IMPLICIT_TLS_PORT
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailSendError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailSendError::InvalidAddress(format!("{}: {}", address, e)))
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageId, MailSendError> {
        let from = parse_mailbox(&self.from_email)?;
        let to = parse_mailbox(to)?;

        // SMTP has no provider-side id, so the Message-ID header doubles as one.
        let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailSendError::Transport(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(MailSendError::Transport)?;

        Ok(MessageId::new(message_id))
    }
}
