//! # Server Module
//!
//! Router, handlers, middleware and shared state.

pub mod handlers;
pub mod middleware;
pub mod state;

pub use handlers::chat_completions;
pub use state::AppState;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{self, TraceLayer},
};
use tracing::Level;

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))

        // Completion endpoints; the legacy path shares the handler
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/completions", post(chat_completions))

        .fallback(handlers::not_found)

        .layer(
            ServiceBuilder::new()
                // Panics become the generic 500 envelope
                .layer(CatchPanicLayer::custom(middleware::handle_panic))

                // Compression skips text/event-stream responses
                .layer(CompressionLayer::new())

                .layer(TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)))

                .layer(CorsLayer::permissive())

                .layer(from_fn(middleware::request_logger)),
        )
        .with_state(state)
}
