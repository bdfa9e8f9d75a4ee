//! Error taxonomy for the tracing subsystem.
//!
//! Store-facing code returns [`TracerError`]; the HTTP layer relies on its
//! [`IntoResponse`] impl to pick a status code. Internal detail (SQL, Redis
//! replies) is logged, never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T, E = TracerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TracerError {
    /// Connection, pool, IO or timeout failure talking to a store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A dashboard sub-query failed or came back in an unexpected shape.
    #[error("aggregation `{metric}` failed: {reason}")]
    Aggregation { metric: &'static str, reason: String },

    #[error("invalid pagination: page={page}, page_size={page_size}")]
    InvalidPagination { page: i64, page_size: i64 },

    /// A stored record could not be decoded (unknown status, bad column type).
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl TracerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TracerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TracerError::InvalidPagination { .. } => StatusCode::BAD_REQUEST,
            TracerError::Aggregation { .. } | TracerError::MalformedRecord(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for TracerError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => TracerError::MalformedRecord(e.to_string()),
            other => TracerError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for TracerError {
    fn from(e: redis::RedisError) -> Self {
        if e.kind() == redis::ErrorKind::TypeError {
            TracerError::MalformedRecord(e.to_string())
        } else {
            TracerError::StoreUnavailable(e.to_string())
        }
    }
}

impl IntoResponse for TracerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let client_message = match &self {
            TracerError::InvalidPagination { .. } => self.to_string(),
            TracerError::StoreUnavailable(detail) => {
                error!(error = %detail, "store unavailable");
                "store unavailable".to_owned()
            }
            TracerError::Aggregation { metric, reason } => {
                error!(metric, reason = %reason, "aggregation failed");
                "internal server error".to_owned()
            }
            TracerError::MalformedRecord(detail) => {
                error!(error = %detail, "malformed record");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
