use crate::verification::application::domain::entities::UserVerificationRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("User {0} no longer exists")]
    NotFound(Uuid),

    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait VerificationRecordStore: Send + Sync {
    async fn find_by_token(
        &self,
        token: Uuid,
    ) -> Result<Option<UserVerificationRecord>, StoreError>;

    async fn update_expiry(
        &self,
        record_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
