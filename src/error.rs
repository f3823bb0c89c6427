// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Identity provider failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("An account with this email already exists")]
    AlreadyRegistered,

    /// The identity store could not be reached.
    #[error("Identity provider unavailable: {0}")]
    Transport(String),
}

/// A failed store call, tagged with what was being attempted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} {entity} failed: {cause}")]
pub struct DataAccessError {
    pub operation: &'static str,
    pub entity: &'static str,
    pub cause: String,
}

impl DataAccessError {
    pub fn new(operation: &'static str, entity: &'static str, cause: impl ToString) -> Self {
        Self {
            operation,
            entity,
            cause: cause.to_string(),
        }
    }
}

/// Chat-completion gateway failures.
///
/// These are returned as values and never escape a feature flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("No OpenAI API key found. Please add your API key in the settings.")]
    MissingCredential,

    #[error("{0}")]
    Provider(String),
}

/// Input rejected before any store or network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self(errors.to_string())
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(err.to_string()),
            ),
            AppError::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::NotAuthenticated => (
                    StatusCode::UNAUTHORIZED,
                    "auth_error",
                    Some(err.to_string()),
                ),
                AuthError::AlreadyRegistered => {
                    (StatusCode::CONFLICT, "auth_error", Some(err.to_string()))
                }
                AuthError::Transport(msg) => {
                    tracing::error!(error = %msg, "Identity provider unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, "auth_unavailable", None)
                }
            },
            AppError::Gateway(err) => (
                StatusCode::BAD_GATEWAY,
                "completion_error",
                Some(err.to_string()),
            ),
            AppError::DataAccess(err) => {
                tracing::error!(
                    operation = err.operation,
                    entity = err.entity,
                    cause = %err.cause,
                    "Database error"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message_mentions_api_key() {
        let msg = GatewayError::MissingCredential.to_string();
        assert!(msg.contains("API key"));
    }

    #[test]
    fn test_data_access_error_display() {
        let err = DataAccessError::new("insert", "activity", "offline");
        assert_eq!(err.to_string(), "insert activity failed: offline");
    }

    #[test]
    fn test_status_codes() {
        let resp = AppError::Validation(ValidationError::new("bad")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Auth(AuthError::InvalidCredentials).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = AppError::Auth(AuthError::Transport("down".into())).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = AppError::DataAccess(DataAccessError::new("list", "reports", "x"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
