// Shared HTTP response types for consistent API error payloads.

use crate::domain::errors::{ErrorKind, MatchError};
use crate::use_cases::RegistryError;
use axum::{Json, extract::rejection::JsonRejection, http::StatusCode};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Stable machine-readable error kind.
    pub code: ErrorKind,
    // Human-readable error string.
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::AlreadySubmitted => StatusCode::CONFLICT,
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(kind: ErrorKind, message: impl Into<String>) -> ApiError {
    (
        status_for(kind),
        Json(ErrorResponse {
            code: kind,
            message: message.into(),
        }),
    )
}

impl From<MatchError> for ErrorResponse {
    fn from(err: MatchError) -> Self {
        // Internal details stay in the logs.
        let message = match err.kind() {
            ErrorKind::Internal => "internal error".to_string(),
            _ => err.to_string(),
        };
        Self {
            code: err.kind(),
            message,
        }
    }
}

pub fn match_error(err: MatchError) -> ApiError {
    let body = ErrorResponse::from(err);
    (status_for(body.code), Json(body))
}

// Unreadable bodies, missing fields and unknown action kinds all land here.
pub fn json_rejection(rejection: JsonRejection) -> ApiError {
    error_response(ErrorKind::InvalidArgument, rejection.body_text())
}

pub fn registry_error(err: RegistryError) -> ApiError {
    match err {
        // Same status as a duplicate action: the resource already exists.
        RegistryError::AlreadyExists => error_response(ErrorKind::AlreadySubmitted, "match already exists"),
        RegistryError::InvalidParticipants | RegistryError::InvalidMatchId => {
            error_response(ErrorKind::InvalidArgument, err.to_string())
        }
        RegistryError::Storage(_) => error_response(ErrorKind::Internal, "internal error"),
    }
}
