//! API error taxonomy and its HTTP mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::repository::RepoError;

pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// Every handler returns `Result<_, ApiError>`. Each variant maps to exactly one
/// status code and a JSON body of the form `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad credentials or no active session (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to touch the resource (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate registration, application or enrollment. Reported as 400.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected failure inside the login flow; the detail is returned to the caller.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LoginFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns any repository failure into a login-path error so the caller sees the cause.
    pub fn login_failed(err: impl std::fmt::Display) -> Self {
        Self::LoginFailed(err.to_string())
    }
}

/// ErrorResponse
///
/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => ErrorResponse {
                error: msg,
                detail: None,
            },
            ApiError::LoginFailed(msg) => {
                tracing::error!(error = %msg, "login failed");
                ErrorResponse {
                    error: "Login failed".to_string(),
                    detail: Some(msg),
                }
            }
            ApiError::Internal(msg) => {
                // Logged here once; the caller only gets a generic message.
                tracing::error!(error = %msg, "internal error");
                ErrorResponse {
                    error: "An internal error occurred".to_string(),
                    detail: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}
