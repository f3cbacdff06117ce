// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures while decrypting Telegram Passport data.
#[derive(Debug, thiserror::Error)]
pub enum PassportError {
    #[error("Invalid passport private key: {0}")]
    InvalidKey(String),

    #[error("Invalid base64 in passport payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("RSA decryption of credentials secret failed")]
    Rsa,

    #[error("AES decryption failed: {0}")]
    Decrypt(String),

    #[error("Decrypted data hash does not match")]
    HashMismatch,

    #[error("Invalid padding in decrypted data")]
    Padding,

    #[error("Decrypted payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No credentials for passport element: {0}")]
    MissingCredentials(String),
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

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Passport error: {0}")]
    Passport(#[from] PassportError),

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

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Telegram(msg) => {
                tracing::warn!(error = %msg, "Telegram API error");
                (StatusCode::BAD_GATEWAY, "telegram_error", None)
            }
            AppError::Passport(err) => {
                tracing::warn!(error = %err, "Passport data rejected");
                (StatusCode::UNPROCESSABLE_ENTITY, "passport_error", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
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

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        AppError::Telegram(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
