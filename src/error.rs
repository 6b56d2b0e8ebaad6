//! HTTP-facing error type.
//!
//! Every error renders as a JSON body `{"error": "<message>"}` with a status
//! code chosen by variant. Database failures are reported as 503 without the
//! driver's message, which is logged instead.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid todo id: {0}")]
    InvalidTodoId(String),

    #[error("Todo not found: {0}")]
    TodoNotFound(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text())
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidTodoId(_) | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::TodoNotFound(_) | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Database unavailable".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
