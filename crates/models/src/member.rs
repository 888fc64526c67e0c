use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored value of a disabled account.
pub const STATUS_DISABLED: i16 = 0;
/// Stored value of an active account (column default).
pub const STATUS_ACTIVE: i16 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: i32,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: i16,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
