//! WebServer-specific error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use engine::EngineError;
use shared::{service_error, ErrorBody, ServiceId, SharedError};

#[derive(Error, Debug)]
pub enum WebServerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("No quotes found for group {group_id}")]
    NoQuotes { group_id: String },

    #[error("Invalid request format: {details}")]
    InvalidRequest { details: String },

    #[error("Server startup error: {0}")]
    ServerStartup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WebServerError {
    pub fn invalid(details: impl Into<String>) -> Self {
        WebServerError::InvalidRequest {
            details: details.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        WebServerError::Config(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebServerError::Engine(error) if error.is_not_found() => StatusCode::NOT_FOUND,
            WebServerError::Engine(error) if error.is_invalid_input() => StatusCode::BAD_REQUEST,
            WebServerError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebServerError::NoQuotes { .. } => StatusCode::NOT_FOUND,
            WebServerError::InvalidRequest { .. } | WebServerError::SharedError(_) => {
                StatusCode::BAD_REQUEST
            }
            WebServerError::ServerStartup(_)
            | WebServerError::Config(_)
            | WebServerError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            service_error!(ServiceId::current(), "❌ Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type WebServerResult<T> = Result<T, WebServerError>;
