use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::email::application::ports::outgoing::{EmailSender, MailSendError, MessageId};
use crate::verification::application::domain::entities::{
    DispatchReceipt, UserVerificationRecord, VerificationRequest,
};
use crate::verification::application::ports::outgoing::{StoreError, VerificationRecordStore};
use crate::verification::application::use_cases::dispatch_verification_email::{
    DispatchError, IDispatchVerificationEmailUseCase,
};

#[derive(Default, Clone)]
pub struct StubDispatchUseCase;

#[async_trait]
impl IDispatchVerificationEmailUseCase for StubDispatchUseCase {
    async fn execute(
        &self,
        _request: VerificationRequest,
    ) -> Result<DispatchReceipt, DispatchError> {
        unimplemented!("Not used in this test")
    }
}

// ============================================================================
// Email sender
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub enum SendBehaviour {
    Succeed,
    SucceedAfter(Duration),
    Fail(MailSendError),
    Hang,
}

/// Records every send attempt; accepted sends get ids `m-1`, `m-2`, ...
#[derive(Clone)]
pub struct RecordingEmailSender {
    behaviour: Arc<Mutex<SendBehaviour>>,
    attempts: Arc<Mutex<Vec<SentEmail>>>,
}

impl RecordingEmailSender {
    pub fn new(behaviour: SendBehaviour) -> Self {
        Self {
            behaviour: Arc::new(Mutex::new(behaviour)),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(SendBehaviour::Succeed)
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(SendBehaviour::Fail(MailSendError::Transport(
            reason.to_string(),
        )))
    }

    pub fn set_behaviour(&self, behaviour: SendBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn attempts(&self) -> Vec<SentEmail> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageId, MailSendError> {
        let attempt_no = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            attempts.len()
        };
        let behaviour = self.behaviour.lock().unwrap().clone();

        match behaviour {
            SendBehaviour::Succeed => Ok(MessageId::new(format!("m-{}", attempt_no))),
            SendBehaviour::SucceedAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(MessageId::new(format!("m-{}", attempt_no)))
            }
            SendBehaviour::Fail(e) => Err(e),
            SendBehaviour::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// Record store
// ============================================================================

#[derive(Default)]
struct StoreState {
    // keyed by verification token
    records: HashMap<Uuid, UserVerificationRecord>,
    lookups: Vec<Uuid>,
    updates: Vec<(Uuid, DateTime<Utc>)>,
    lookup_failure: Option<StoreError>,
    update_failure: Option<StoreError>,
    hang: bool,
    hang_on_update: bool,
}

/// Users table stand-in. Clones share state so tests can inspect it after
/// handing a copy to the use case.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRecordStore {
    pub fn with_record(self, id: Uuid, token: Uuid) -> Self {
        self.state.lock().unwrap().records.insert(
            token,
            UserVerificationRecord {
                id,
                verification_token: token,
                verification_link_expiry_timestamp: Utc::now(),
                user_verification_status: false,
            },
        );
        self
    }

    pub fn failing_lookup(self, err: StoreError) -> Self {
        self.state.lock().unwrap().lookup_failure = Some(err);
        self
    }

    pub fn failing_update(self, err: StoreError) -> Self {
        self.state.lock().unwrap().update_failure = Some(err);
        self
    }

    pub fn hanging(self) -> Self {
        self.state.lock().unwrap().hang = true;
        self
    }

    pub fn hanging_on_update(self) -> Self {
        self.state.lock().unwrap().hang_on_update = true;
        self
    }

    pub fn lookups(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn updates(&self) -> Vec<(Uuid, DateTime<Utc>)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn expiry_of(&self, token: Uuid) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&token)
            .map(|r| r.verification_link_expiry_timestamp)
    }

    pub fn call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.lookups.len() + state.updates.len()
    }
}

#[async_trait]
impl VerificationRecordStore for InMemoryRecordStore {
    async fn find_by_token(
        &self,
        token: Uuid,
    ) -> Result<Option<UserVerificationRecord>, StoreError> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.lookups.push(token);
            if let Some(err) = state.lookup_failure.clone() {
                return Err(err);
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }

        Ok(self.state.lock().unwrap().records.get(&token).cloned())
    }

    async fn update_expiry(
        &self,
        record_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.updates.push((record_id, new_expiry));
            if let Some(err) = state.update_failure.clone() {
                return Err(err);
            }
            state.hang_on_update
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        let record = state
            .records
            .values_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::NotFound(record_id))?;
        record.verification_link_expiry_timestamp = new_expiry;
        Ok(())
    }
}
