//! # Dummy Completions - Mock OpenAI-Compatible Completions Server
//!
//! A stand-in for a real LLM backend behind the chat application. It answers
//! `POST /v1/chat/completions` with a canned assistant reply, either streamed
//! line by line over Server-Sent Events or as a single JSON document, using
//! the same wire shapes the frontend expects from a real provider.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dummy_completions::{create_router, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = create_router(AppState::new(config.clone()));
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`mode`] - request validation and chat/prompt, stream/buffer resolution
//! - [`reply`] - pluggable reply sources, including the canned reply
//! - [`streaming`] - paced chunk producer and the two transports
//! - [`schemas`] - request/response data structures
//! - [`error`] - error type and the HTTP error envelope
//! - [`config`] - CLI and environment configuration
//! - [`graceful_shutdown`] - signal handling and connection draining
//! - `server` - router, handlers and middleware (feature `server`)

pub mod config;
pub mod error;
pub mod graceful_shutdown;
pub mod mode;
pub mod reply;
pub mod schemas;
pub mod streaming;

#[cfg(feature = "server")]
pub mod server;

pub use config::Config;
pub use error::ProxyError;
pub use graceful_shutdown::GracefulShutdown;
pub use mode::{CompletionModes, ValidRequest};
pub use reply::{CannedReply, ReplySource, ReplyStream, CANNED_REPLY};
pub use schemas::{ChoiceView, CompletionChunk, CompletionDocument, CompletionRequest};
pub use streaming::{CompletionProducer, DEFAULT_CHUNK_DELAY};

#[cfg(feature = "server")]
pub use server::{create_router, AppState};

/// The result type used throughout the library
pub type Result<T> = std::result::Result<T, ProxyError>;
