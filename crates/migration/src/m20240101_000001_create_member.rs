//! Create `member` table.
//!
//! End-user accounts; `deleted_at` is the soft-delete marker. Email uniqueness is enforced by a
//! partial index added in the index migration, so the column itself carries no unique key.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(big_integer(Member::Id).primary_key().auto_increment())
                    .col(string_len(Member::Name, 100).not_null())
                    .col(string_len(Member::Email, 100).not_null())
                    .col(string_len(Member::PasswordHash, 255).not_null().default(""))
                    .col(integer(Member::Age).not_null().default(0))
                    .col(
                        ColumnDef::new(Member::Phone)
                            .string_len(20)
                            .null(),
                    )
                    .col(ColumnDef::new(Member::Avatar).string_len(500).null())
                    .col(small_integer(Member::Status).not_null().default(1))
                    .col(timestamp_with_time_zone(Member::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Member::UpdatedAt).not_null())
                    .col(
                        ColumnDef::new(Member::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Member::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Member { Table, Id, Name, Email, PasswordHash, Age, Phone, Avatar, Status, CreatedAt, UpdatedAt, DeletedAt }
