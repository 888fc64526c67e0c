use std::time::Duration;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::error_catalog::ErrorKind;
use crate::member::domain::MemberId;

/// Failures reported by repository ports.
///
/// "Record absent" is never an error at this level; lookups return `Option`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A storage unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    /// The call was abandoned after exceeding its deadline.
    #[error("storage call exceeded deadline of {0:?}")]
    Timeout(Duration),
    #[error("storage error: {0}")]
    Db(String),
}

impl From<DbErr> for RepositoryError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::UniqueViolation(msg),
            _ => Self::Db(e.to_string()),
        }
    }
}

/// Business errors of the member core. Each variant maps to exactly one [`ErrorKind`].
#[derive(Debug, Error)]
pub enum MemberError {
    #[error("database error: {0}")]
    Database(#[source] RepositoryError),
    #[error("member {0} not found")]
    NotFound(MemberId),
    #[error("email already exists")]
    EmailExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemberError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MemberError::Database(_) => ErrorKind::DatabaseError,
            MemberError::NotFound(_) => ErrorKind::NotFound,
            MemberError::EmailExists => ErrorKind::EmailExists,
            MemberError::InvalidCredentials => ErrorKind::InvalidCredentials,
            MemberError::AccountDisabled => ErrorKind::AccountDisabled,
            MemberError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// `true` when the storage call ran out of time rather than failing outright.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MemberError::Database(RepositoryError::Timeout(_)))
    }
}

impl From<RepositoryError> for MemberError {
    fn from(e: RepositoryError) -> Self { MemberError::Database(e) }
}
