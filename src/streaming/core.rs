//! # Core Streaming Functionality
//!
//! SSE framing shared by the producer and the tests: how a chunk becomes a
//! `data: ...\n\n` payload, how the stream is terminated, and how an error is
//! reported once headers are already on the wire.

use bytes::Bytes;
use serde::Serialize;

use crate::{
    error::ProxyError,
    schemas::{CompletionChunk, STREAM_FINISH_REASON},
};

/// Literal sentinel closing every successful stream.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Payload of the sentinel line, without framing.
pub const DONE_PAYLOAD: &str = "[DONE]";

/// Frame any serializable payload as one SSE data line.
pub fn encode_event<T: Serialize>(payload: &T) -> String {
    format!("data: {}\n\n", serde_json::to_string(payload).unwrap_or_default())
}

/// Frame a reported error. The stream ends after this frame.
pub fn error_frame(error: &ProxyError) -> Bytes {
    Bytes::from(encode_event(&error.to_stream_error()))
}

/// Per-stream progress: which index comes next and whether the stream ended.
#[derive(Debug, Clone)]
pub struct StreamingState {
    /// Model echoed in every chunk
    pub model: String,
    /// Index of the next chunk
    pub chunk_index: usize,
    /// Whether the terminator has been produced
    pub is_finished: bool,
}

impl StreamingState {
    pub fn new(model: String) -> Self {
        Self {
            model,
            chunk_index: 0,
            is_finished: false,
        }
    }

    /// Get the next chunk index and increment
    pub fn next_index(&mut self) -> usize {
        let index = self.chunk_index;
        self.chunk_index += 1;
        index
    }

    /// Frame one content chunk and advance the index.
    pub fn content_frame(&mut self, content: String) -> Bytes {
        let index = self.next_index();
        let chunk = CompletionChunk::new(&self.model, index, content, None);
        Bytes::from(encode_event(&chunk))
    }

    /// Frame the terminator chunk followed by the `[DONE]` sentinel, as one payload.
    pub fn final_frame(&mut self) -> Bytes {
        let chunk = CompletionChunk::new(
            &self.model,
            self.chunk_index,
            String::new(),
            Some(STREAM_FINISH_REASON),
        );
        self.is_finished = true;

        let mut frame = encode_event(&chunk);
        frame.push_str(DONE_FRAME);
        Bytes::from(frame)
    }
}

/// Counters for one stream, logged when it ends.
#[derive(Debug, Clone, Default)]
pub struct StreamingMetrics {
    pub total_chunks: usize,
    pub total_bytes: usize,
    pub stream_duration_ms: u64,
    pub errors: usize,
}

impl StreamingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame being sent
    pub fn record_chunk(&mut self, frame_length: usize) {
        self.total_chunks += 1;
        self.total_bytes += frame_length;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.stream_duration_ms = duration_ms;
    }
}

/// Split an SSE body into its `data:` payloads, in order.
///
/// Blank lines and other SSE fields (`id:`, `event:`, comments) are skipped.
pub fn data_payloads(body: &str) -> Vec<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|payload| payload.strip_prefix(' ').unwrap_or(payload))
        .filter(|payload| !payload.is_empty())
        .collect()
}
