//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while giving every
//! failure the same JSON envelope:
//! `{ "success": false, "error": { "type", "message", "details"?, "timestamp" } }`.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode};
use crate::middleware::trace::TRACE_ID_HEADER;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Message substituted for anything the client must not see.
pub const GENERIC_FAILURE: &str = "Internal server error";

/// Error section of the envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    #[schema(example = "VALIDATION_ERROR")]
    pub kind: ErrorCode,
    #[schema(example = "Validation failed")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Uniform failure response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[schema(example = false)]
    pub success: bool,
    pub error: ErrorBody,
}

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ErrorCode::AuthenticationError => StatusCode::UNAUTHORIZED,
        ErrorCode::AuthorizationError => StatusCode::FORBIDDEN,
        ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
        ErrorCode::DuplicateResource => StatusCode::CONFLICT,
        ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-safe view of `error`.
///
/// Non-operational errors collapse to a bare internal error; server-fault
/// codes keep their type but lose message and details.
pub fn envelope_for(error: &Error) -> ErrorEnvelope {
    let body = if !error.is_operational() {
        ErrorBody {
            kind: ErrorCode::InternalError,
            message: GENERIC_FAILURE.to_owned(),
            details: None,
            timestamp: error.timestamp(),
        }
    } else if error.code().is_server_fault() {
        ErrorBody {
            kind: error.code(),
            message: GENERIC_FAILURE.to_owned(),
            details: None,
            timestamp: error.timestamp(),
        }
    } else {
        ErrorBody {
            kind: error.code(),
            message: error.message().to_owned(),
            details: error.details().cloned(),
            timestamp: error.timestamp(),
        }
    };
    ErrorEnvelope {
        success: false,
        error: body,
    }
}

/// Render `error` with an explicit status.
///
/// Used where the status is dictated by the caller rather than the error
/// type, such as the strict-regime protector failure.
pub fn render_with_status(error: &Error, status: StatusCode) -> HttpResponse {
    let mut builder = HttpResponse::build(status);
    if let Some(id) = error.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
    }
    builder.json(envelope_for(error))
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        if self.is_operational() {
            status_for(self.code())
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        render_with_status(self, self.status_code())
    }
}
