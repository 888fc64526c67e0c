//! Stable classification of member errors.
//!
//! Every [`MemberError`] resolves to one [`ErrorKind`]; the [`ErrorCatalog`] maps kinds to the
//! numeric code, i18n key, default message and HTTP status that outer layers expose. The catalog
//! is a plain immutable value: build it once at startup and share it by reference.

use axum::http::StatusCode;
use serde::Serialize;

use crate::errors::MemberError;

/// Error module number of the member domain.
pub const MODULE_MEMBER: u32 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DatabaseError,
    NotFound,
    EmailExists,
    InvalidCredentials,
    AccountDisabled,
    InternalError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::DatabaseError,
        ErrorKind::NotFound,
        ErrorKind::EmailExists,
        ErrorKind::InvalidCredentials,
        ErrorKind::AccountDisabled,
        ErrorKind::InternalError,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub module: u32,
    pub code: u32,
    pub key: &'static str,
    pub message: &'static str,
    pub status: StatusCode,
}

impl ErrorDescriptor {
    /// Code shown to clients: `module * 10000 + code`, e.g. `251002`.
    pub fn full_code(&self) -> u32 { self.module * 10_000 + self.code }
}

#[derive(Clone, Debug)]
pub struct ErrorCatalog {
    entries: [ErrorDescriptor; 6],
}

impl ErrorCatalog {
    /// The member domain table.
    pub fn member() -> Self {
        let entry = |kind: ErrorKind, code: u32, key: &'static str, message: &'static str, status: StatusCode| ErrorDescriptor {
            kind,
            module: MODULE_MEMBER,
            code,
            key,
            message,
            status,
        };
        Self {
            entries: [
                entry(ErrorKind::DatabaseError, 1001, "error.member.database_error", "database operation failed", StatusCode::INTERNAL_SERVER_ERROR),
                entry(ErrorKind::NotFound, 1002, "error.member.not_found", "member not found", StatusCode::NOT_FOUND),
                entry(ErrorKind::EmailExists, 1003, "error.member.email_exists", "email already exists", StatusCode::CONFLICT),
                entry(ErrorKind::InvalidCredentials, 1004, "error.member.invalid_credentials", "invalid email or password", StatusCode::UNAUTHORIZED),
                entry(ErrorKind::AccountDisabled, 1005, "error.member.account_disabled", "account is disabled", StatusCode::FORBIDDEN),
                entry(ErrorKind::InternalError, 1006, "error.member.internal_error", "internal error", StatusCode::INTERNAL_SERVER_ERROR),
            ],
        }
    }

    pub fn describe(&self, kind: ErrorKind) -> &ErrorDescriptor {
        // entries are laid out in `ErrorKind::ALL` order
        &self.entries[kind as usize]
    }

    pub fn classify(&self, err: &MemberError) -> &ErrorDescriptor { self.describe(err.kind()) }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorDescriptor> { self.entries.iter() }
}

impl Default for ErrorCatalog {
    fn default() -> Self { Self::member() }
}
