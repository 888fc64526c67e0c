//! Create `member_login_log` table.
//!
//! Append-only audit of successful logins. `user_id` is deliberately not a foreign key: entries
//! outlive the account and keep the username snapshot for history.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MemberLoginLog::Table)
                    .if_not_exists()
                    .col(big_integer(MemberLoginLog::Id).primary_key().auto_increment())
                    .col(big_integer(MemberLoginLog::UserId).not_null())
                    .col(string_len(MemberLoginLog::Username, 100).not_null().default(""))
                    .col(string_len(MemberLoginLog::Ip, 64).not_null())
                    .col(string_len(MemberLoginLog::UserAgent, 500).not_null().default(""))
                    .col(string_len(MemberLoginLog::DeviceId, 100).not_null().default(""))
                    .col(string_len(MemberLoginLog::City, 100).not_null().default(""))
                    .col(string_len(MemberLoginLog::Country, 100).not_null().default(""))
                    .col(timestamp_with_time_zone(MemberLoginLog::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MemberLoginLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MemberLoginLog { Table, Id, UserId, Username, Ip, UserAgent, DeviceId, City, Country, CreatedAt }
