use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use invoicer_auth::AuthError;
use invoicer_core::DomainError;
use invoicer_infra::{MailError, StoreError};

/// Request failure, rendered as `{"error": code, "message": ..., "details"?: ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Internal { message: String, details: String },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            details: details.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
            DomainError::NotFound(kind) => ApiError::not_found(format!("{kind} not found")),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::Decode(_) | AuthError::Claims(_) => ApiError::unauthorized(err.to_string()),
            AuthError::Hashing(_) => {
                tracing::error!(error = %err, "password hashing failed");
                ApiError::internal("Authentication failed", err)
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Conflict("User already exists".to_string()),
            StoreError::NotFound => ApiError::not_found("Not found"),
            StoreError::Backend(_) => {
                tracing::error!(error = %err, "store operation failed");
                ApiError::internal("Storage operation failed", err)
            }
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::InvalidAddress(_) => ApiError::BadRequest(err.to_string()),
            MailError::Build(_) | MailError::Transport(_) => {
                tracing::error!(error = %err, "email dispatch failed");
                ApiError::internal("Failed to send email.", err)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({
                    "error": "internal_error",
                    "message": message,
                    "details": details,
                })),
            )
                .into_response(),
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
