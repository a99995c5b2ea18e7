//! # Error Handling
//!
//! One error type for the whole crate. Handlers return `Result<_, ProxyError>`
//! and axum turns the error into the `{"success": false, "error": ...}`
//! envelope used by the rest of the chat backend.

#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::schemas::{ErrorDetails, ErrorEnvelope, StreamingError};

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Upstream Error: {0}")]
    Upstream(String),
    #[error("Internal Error: {0}")]
    Internal(String),
    #[error("Serialization Error: {0}")]
    Serialization(String),
}

impl ProxyError {
    /// OpenAI-style error type string, used inside stream error events.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProxyError::BadRequest(_) => "invalid_request_error",
            ProxyError::NotFound(_) => "not_found_error",
            ProxyError::Upstream(_) => "api_error",
            ProxyError::Internal(_) => "internal_error",
            ProxyError::Serialization(_) => "serialization_error",
        }
    }

    /// Message without the variant prefix, as it appears in the envelope.
    pub fn message(&self) -> &str {
        match self {
            ProxyError::BadRequest(msg)
            | ProxyError::NotFound(msg)
            | ProxyError::Upstream(msg)
            | ProxyError::Internal(msg)
            | ProxyError::Serialization(msg) => msg,
        }
    }

    /// Envelope body for buffered responses.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.message())
    }

    /// Payload for a best-effort error event once a stream has started.
    pub fn to_stream_error(&self) -> StreamingError {
        StreamingError {
            error: ErrorDetails {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
                code: None,
            },
        }
    }

    #[cfg(feature = "server")]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) | ProxyError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(feature = "server")]
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        (status, Json(self.to_envelope())).into_response()
    }
}

impl From<serde_json::Error> for ProxyError {
    /// Syntax and data errors come from a client body; anything else is ours.
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            ProxyError::BadRequest(format!("Invalid JSON body: {}", err))
        } else {
            ProxyError::Serialization(format!("JSON error: {}", err))
        }
    }
}

#[cfg(feature = "server")]
impl From<axum::http::Error> for ProxyError {
    fn from(err: axum::http::Error) -> Self {
        ProxyError::Internal(format!("HTTP protocol error: {}", err))
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => {
                ProxyError::Upstream("I/O operation timed out".to_string())
            }
            _ => ProxyError::Internal(format!("I/O error: {}", err)),
        }
    }
}
