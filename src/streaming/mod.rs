//! # Streaming Module
//!
//! The completion protocol simulator: a paced producer of OpenAI-style chunks
//! and the transports that deliver it.
//!
//! ## Key Pieces:
//! - [`core`] - SSE framing, per-stream state and counters
//! - [`producer`] - the lazy, cancellable generator
//! - [`buffered`] - drain-and-assemble for `stream: false`
//! - `transport` - axum responses for both delivery modes (feature `server`)

pub mod buffered;
pub mod core;
pub mod producer;

#[cfg(feature = "server")]
pub mod transport;

pub use self::core::{data_payloads, StreamingMetrics, StreamingState, DONE_FRAME, DONE_PAYLOAD};
pub use buffered::{build_document, collect_document};
pub use producer::{CompletionProducer, DEFAULT_CHUNK_DELAY};

#[cfg(feature = "server")]
use crate::{error::ProxyError, mode::ValidRequest, server::AppState};

/// Build the producer for `request` and hand it to the transport its
/// streaming flag selects.
#[cfg(feature = "server")]
pub async fn create_completion_response(
    state: &AppState,
    request: ValidRequest,
) -> Result<axum::response::Response, ProxyError> {
    let streaming = request.modes.streaming;
    let producer = CompletionProducer::new(state.reply_source(), request)
        .with_chunk_delay(state.config().chunk_delay())
        .with_cancellation(state.shutdown_token().child_token());

    if streaming {
        transport::sse_response(producer)
    } else {
        transport::json_response(producer).await
    }
}
