//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Caller identity missing or malformed
    Unauthenticated(String),
    /// Invalid request shape
    BadRequest(String),
    /// Engine-level outcome (denials, not-found, unauthorized, faults)
    Engine(EngineError),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Map an engine outcome to a status code.
    ///
    /// Denials (window, duplicates, validation) are 422 so they cannot be
    /// confused with malformed requests; missing resources are 404 whether
    /// the entity or the registration is absent; ownership failures are 403.
    fn engine_status(err: &EngineError) -> StatusCode {
        match err {
            EngineError::Validation(_)
            | EngineError::WindowNotOpen { .. }
            | EngineError::Duplicate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::EntityNotFound { .. } | EngineError::RegistrationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            EngineError::Unauthorized => StatusCode::FORBIDDEN,
            EngineError::CodeExhausted { .. } | EngineError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Unauthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHENTICATED", msg),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Engine(e) => {
                let status = Self::engine_status(&e);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %e, "request failed");
                }
                (status, ApiError::new(e.code(), e.to_string()))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<crate::db::repository::RepositoryError> for AppError {
    fn from(err: crate::db::repository::RepositoryError) -> Self {
        AppError::Engine(EngineError::Repository(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
