// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Human-readable labels for the HTTP statuses the CRM documents.
const STATUS_DESCRIPTIONS: &[(u16, &str)] = &[
    (400, "Bad request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not found"),
    (500, "Internal server error"),
    (502, "Bad gateway"),
    (503, "Service unavailable"),
];

/// Describe an HTTP status code using the fixed label table.
pub fn status_description(status: u16) -> &'static str {
    STATUS_DESCRIPTIONS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, label)| *label)
        .unwrap_or("Undefined error")
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("HTTP {status} ({message}). Response: {body}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Pagination limit of {max_pages} pages exceeded for {entity}")]
    PaginationLimitExceeded { entity: String, max_pages: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Build an API error from a non-2xx status and the raw response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        AppError::Api {
            status,
            message: status_description(status).to_string(),
            body: body.into(),
        }
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(_) | AppError::PaginationLimitExceeded { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(status = status.as_u16(), error = %self, "Job failed");

        let body = ErrorResponse {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
