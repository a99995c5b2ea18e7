//! # Dummy Completions Server
//!
//! Parses configuration, serves the router, and drains on SIGINT/SIGTERM.

use std::future::IntoFuture;

use dummy_completions::{create_router, AppState, Config, GracefulShutdown};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from CLI args and .env file
    let config = Config::parse_args();

    let shutdown = GracefulShutdown::new();
    let state = AppState::new(config.clone()).with_shutdown_token(shutdown.token());
    let app = create_router(state);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🚀 Chat backend API listening on http://{}", listener.local_addr()?);
    info!("Default model: {}", config.default_model);
    info!("Chunk delay: {}ms", config.chunk_delay_ms);

    shutdown.spawn_signal_handler();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.initiated())
        .into_future();

    shutdown
        .run_until_drained(config.shutdown_timeout(), server)
        .await?;

    Ok(())
}
