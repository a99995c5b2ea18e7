//! # Server Handlers
//!
//! HTTP route handlers for the server.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
};
use tracing::info;

use super::AppState;
use crate::{error::ProxyError, mode::ValidRequest, streaming::create_completion_response};

/// Chat completions handler, mounted on both completion routes.
///
/// The body is taken as raw bytes so malformed JSON gets the same error
/// envelope as every other failure instead of axum's rejection text.
pub async fn chat_completions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let request = ValidRequest::from_slice(&body, &state.config().default_model)?;

    info!(
        model = %request.model,
        streaming = request.modes.streaming,
        prompt_mode = request.modes.prompt_mode,
        "completion request"
    );

    create_completion_response(&state, request).await
}

/// Root liveness probe, same body the rest of the chat backend returns.
pub async fn root() -> impl IntoResponse {
    JsonResponse(serde_json::json!({
        "success": true,
        "message": "Chat Backend API is running!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Health check handler
pub async fn health_check() -> impl IntoResponse {
    let health_status = serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "dummy-completions",
        "version": env!("CARGO_PKG_VERSION")
    });

    (StatusCode::OK, JsonResponse(health_status))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ProxyError {
    ProxyError::NotFound("Route not found".to_string())
}
