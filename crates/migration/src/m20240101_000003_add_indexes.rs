use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

// sea-query has no portable partial index builder; Postgres syntax is fine here.
const CREATE_UNIQ_MEMBER_EMAIL: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS uniq_member_email_live ON member (email) WHERE deleted_at IS NULL";
const DROP_UNIQ_MEMBER_EMAIL: &str = "DROP INDEX IF EXISTS uniq_member_email_live";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Member: email unique among rows that are not soft-deleted
        manager.get_connection().execute_unprepared(CREATE_UNIQ_MEMBER_EMAIL).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_member_name")
                    .table(Member::Table)
                    .col(Member::Name)
                    .to_owned(),
            )
            .await?;

        // MemberLoginLog: index on user_id and created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_login_log_user")
                    .table(MemberLoginLog::Table)
                    .col(MemberLoginLog::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_login_log_created_at")
                    .table(MemberLoginLog::Table)
                    .col(MemberLoginLog::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DROP_UNIQ_MEMBER_EMAIL).await?;
        manager
            .drop_index(Index::drop().name("idx_member_name").table(Member::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_login_log_user").table(MemberLoginLog::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_login_log_created_at").table(MemberLoginLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Member { Table, Name }

#[derive(DeriveIden)]
enum MemberLoginLog { Table, UserId, CreatedAt }
