use crate::email::application::ports::outgoing::{EmailSender, MailSendError};
use crate::email::application::services::VerificationEmail;
use crate::verification::application::domain::entities::{
    DispatchReceipt, InvalidRequest, VerificationRequest,
};
use crate::verification::application::ports::outgoing::{StoreError, VerificationRecordStore};
use async_trait::async_trait;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] InvalidRequest),

    #[error("Error sending verification email: {0}")]
    MailSend(#[from] MailSendError),

    #[error("No user found for verification token {0}")]
    RecordNotFound(uuid::Uuid),

    #[error("Error looking up verification record: {0}")]
    RecordLookup(StoreError),

    #[error("Error updating verification link expiry: {0}")]
    RecordUpdate(StoreError),

    #[error("Expiry window {0} overflows the timestamp range")]
    ExpiryOutOfRange(chrono::Duration),
}

impl DispatchError {
    /// True once the email has gone out, i.e. redelivering would send it again.
    pub fn email_was_sent(&self) -> bool {
        matches!(
            self,
            DispatchError::RecordNotFound(_)
                | DispatchError::RecordLookup(_)
                | DispatchError::RecordUpdate(_)
                | DispatchError::ExpiryOutOfRange(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub verify_email_link: String,
    pub expiry_window: chrono::Duration,
    pub mail_timeout: Duration,
    pub store_timeout: Duration,
}

#[async_trait]
pub trait IDispatchVerificationEmailUseCase: Send + Sync {
    async fn execute(&self, request: VerificationRequest)
        -> Result<DispatchReceipt, DispatchError>;
}

/// Sends the verification email, then stamps the link expiry on the user row.
///
/// The steps run strictly in order and stop at the first failure: validate,
/// send, look up by token, update expiry. Nothing is retried here; a failed
/// send is retried only if the transport redelivers the event, and a
/// redelivered event sends the email again and restarts the expiry window.
pub struct DispatchVerificationEmailUseCase<S>
where
    S: VerificationRecordStore,
{
    store: S,
    email_sender: Arc<dyn EmailSender>,
    settings: DispatchSettings,
}

impl<S> DispatchVerificationEmailUseCase<S>
where
    S: VerificationRecordStore,
{
    pub fn new(store: S, email_sender: Arc<dyn EmailSender>, settings: DispatchSettings) -> Self {
        Self {
            store,
            email_sender,
            settings,
        }
    }
}

async fn bounded<T, E, F>(
    limit: Duration,
    call: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}

#[async_trait]
impl<S> IDispatchVerificationEmailUseCase for DispatchVerificationEmailUseCase<S>
where
    S: VerificationRecordStore,
{
    async fn execute(
        &self,
        request: VerificationRequest,
    ) -> Result<DispatchReceipt, DispatchError> {
        let target = request.validate().map_err(|e| {
            warn!(email = %request.email, token = %request.token, error = %e, "Discarding malformed verification request");
            DispatchError::MalformedEvent(e)
        })?;
        let email = target.email.as_str();
        let token = target.token;

        let message = VerificationEmail::compose(&self.settings.verify_email_link, &token);

        let message_id = bounded(
            self.settings.mail_timeout,
            self.email_sender
                .send_email(email, message.subject, &message.body),
            MailSendError::Timeout,
        )
        .await
        .map_err(|e| {
            error!(email, %token, error = %e, "Error sending verification email");
            DispatchError::MailSend(e)
        })?;

        info!(email, %token, %message_id, "Verification email sent");

        let record = bounded(
            self.settings.store_timeout,
            self.store.find_by_token(token),
            StoreError::Timeout,
        )
        .await
        .map_err(|e| {
            error!(email, %token, %message_id, error = %e, "Error looking up user for verification token");
            DispatchError::RecordLookup(e)
        })?;

        let Some(record) = record else {
            warn!(email, %token, %message_id, "Verification email sent but no user holds this token");
            return Err(DispatchError::RecordNotFound(token));
        };

        let sent_at = Utc::now();
        let Some(expires_at) = sent_at.checked_add_signed(self.settings.expiry_window) else {
            error!(
                email,
                %token,
                %message_id,
                user_id = %record.id,
                window_ms = self.settings.expiry_window.num_milliseconds(),
                "Verification link expiry out of range"
            );
            return Err(DispatchError::ExpiryOutOfRange(self.settings.expiry_window));
        };

        bounded(
            self.settings.store_timeout,
            self.store.update_expiry(record.id, expires_at),
            StoreError::Timeout,
        )
        .await
        .map_err(|e| {
            error!(
                email,
                %token,
                %message_id,
                user_id = %record.id,
                error = %e,
                "Error updating verification link expiry"
            );
            DispatchError::RecordUpdate(e)
        })?;

        info!(
            email,
            %token,
            %message_id,
            user_id = %record.id,
            sent_at = %sent_at.timestamp_millis(),
            expires_at = %expires_at.to_rfc3339(),
            "Verification link expiry recorded"
        );

        Ok(DispatchReceipt {
            message_id,
            user_id: record.id,
            expires_at,
        })
    }
}
