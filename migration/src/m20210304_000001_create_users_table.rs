use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// The account service owns this table; the verify-email function only reads
// `verification_token` and writes `verification_link_expiry_timestamp`.
fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Users::FirstName).string().not_null())
        .col(ColumnDef::new(Users::LastName).string().not_null())
        .col(ColumnDef::new(Users::Password).string().not_null())
        .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
        .col(
            ColumnDef::new(Users::AccountCreated)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Users::AccountUpdated)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Users::VerificationToken)
                .uuid()
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Users::VerificationLinkExpiryTimestamp)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Users::UserVerificationStatus)
                .boolean()
                .not_null()
                .default(false),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    FirstName,
    LastName,
    Password,
    Username,
    AccountCreated,
    AccountUpdated,
    VerificationToken,
    VerificationLinkExpiryTimestamp,
    UserVerificationStatus,
}
