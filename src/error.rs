// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::services::identity::AuthErrorCode;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

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

    /// Identity provider rejected the request; shown inline on the auth page.
    #[error("{}", AuthErrorCode::message(.0))]
    Auth(AuthErrorCode),

    #[error("Database error: {0}")]
    Database(String),

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

impl AppError {
    /// HTTP status for an identity provider error code.
    fn auth_status(code: &AuthErrorCode) -> StatusCode {
        match code {
            AuthErrorCode::EmailAlreadyInUse => StatusCode::CONFLICT,
            AuthErrorCode::InvalidEmail
            | AuthErrorCode::WeakPassword
            | AuthErrorCode::MissingDisplayName
            | AuthErrorCode::PopupClosedByUser => StatusCode::BAD_REQUEST,
            AuthErrorCode::UserNotFound
            | AuthErrorCode::WrongPassword
            | AuthErrorCode::InvalidCredential => StatusCode::UNAUTHORIZED,
            AuthErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthErrorCode::NetworkRequestFailed => StatusCode::BAD_GATEWAY,
            AuthErrorCode::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string(), None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token".to_string(), None),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "not_found".to_string(),
                Some(msg.clone()),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "bad_request".to_string(),
                Some(msg.clone()),
            ),
            AppError::Auth(code) => {
                tracing::info!(code = %code.code(), "Authentication request rejected");
                (
                    Self::auth_status(code),
                    code.code().to_string(),
                    Some(code.message().to_string()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse { error, details };

        (status, Json(body)).into_response()
    }
}

impl From<AuthErrorCode> for AppError {
    fn from(code: AuthErrorCode) -> Self {
        AppError::Auth(code)
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
