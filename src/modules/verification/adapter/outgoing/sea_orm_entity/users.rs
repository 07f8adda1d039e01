use sea_orm::entity::prelude::*;
use uuid::Uuid;

// Owned by the account service; only the verification columns are written from here.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[sea_orm(unique)]
    pub username: String,
    pub account_created: DateTimeWithTimeZone,
    pub account_updated: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub verification_token: Uuid,
    pub verification_link_expiry_timestamp: DateTimeWithTimeZone,
    pub user_verification_status: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
