use super::sea_orm_entity::users::{
    Column as UserColumn, Entity as UserEntity, Model as UserModel,
};
use crate::verification::application::domain::entities::UserVerificationRecord;
use crate::verification::application::ports::outgoing::{StoreError, VerificationRecordStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct VerificationStorePostgres {
    db: Arc<DatabaseConnection>,
}

impl VerificationStorePostgres {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn map_to_record(model: UserModel) -> UserVerificationRecord {
        UserVerificationRecord {
            id: model.id,
            verification_token: model.verification_token,
            verification_link_expiry_timestamp: model
                .verification_link_expiry_timestamp
                .with_timezone(&Utc),
            user_verification_status: model.user_verification_status,
        }
    }
}

#[async_trait]
impl VerificationRecordStore for VerificationStorePostgres {
    async fn find_by_token(
        &self,
        token: Uuid,
    ) -> Result<Option<UserVerificationRecord>, StoreError> {
        let user = UserEntity::find()
            .filter(UserColumn::VerificationToken.eq(token))
            .one(&*self.db)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user.map(Self::map_to_record))
    }

    async fn update_expiry(
        &self,
        record_id: Uuid,
        new_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = UserEntity::update_many()
            .col_expr(
                UserColumn::VerificationLinkExpiryTimestamp,
                Expr::value(new_expiry.fixed_offset()),
            )
            .filter(UserColumn::Id.eq(record_id))
            .exec(&*self.db)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(record_id));
        }

        Ok(())
    }
}
