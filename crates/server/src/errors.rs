use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use service::{ErrorCatalog, MemberError};

/// Client-facing error body.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: u32,
    pub key: &'static str,
    pub message: String,
}

/// Code and key used for requests rejected before they reach a service.
pub const INVALID_REQUEST_CODE: u32 = 400;
pub const INVALID_REQUEST_KEY: &str = "error.request.invalid";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input caught at the boundary.
    #[error("invalid request: {0}")]
    Validation(String),
    /// A classified service failure.
    #[error("{message}")]
    Classified { status: StatusCode, code: u32, key: &'static str, message: &'static str },
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// Resolve a service error through the catalog. The storage cause is logged, never rendered.
    pub fn from_member(catalog: &ErrorCatalog, err: MemberError) -> Self {
        let d = catalog.classify(&err);
        if d.status.is_server_error() {
            error!(code = d.full_code(), key = d.key, error = ?err, "request failed");
        } else {
            warn!(code = d.full_code(), key = d.key, error = %err, "request rejected");
        }
        ApiError::Classified { status: d.status, code: d.full_code(), key: d.key, message: d.message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Classified { status, .. } => *status,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(msg) => ErrorBody { code: INVALID_REQUEST_CODE, key: INVALID_REQUEST_KEY, message: msg.clone() },
            ApiError::Classified { code, key, message, .. } => ErrorBody { code: *code, key, message: (*message).to_string() },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
