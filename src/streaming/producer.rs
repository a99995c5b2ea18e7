//! # Completion Producer
//!
//! Lazy generator behind both transports. In streaming mode it pulls one line
//! from the reply source, waits out the pacing delay, and yields one framed
//! chunk; nothing is produced until the transport asks for the next frame.
//! In buffered mode it yields a single raw reply with no delay.
//!
//! Every producer owns a [`CancellationToken`]. Cancelling it (server
//! shutdown, or the body being dropped on client disconnect) stops the loop
//! at the next await point.

use std::{future::Future, sync::Arc, time::Duration};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::ProxyError,
    mode::ValidRequest,
    reply::ReplySource,
    schemas::BufferedReply,
    streaming::core::{error_frame, StreamingMetrics, StreamingState},
};

/// Default pause before each streamed chunk.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(256);

/// One request's producer. Consumed by either [`frames`](Self::frames) or
/// [`responses`](Self::responses).
pub struct CompletionProducer {
    source: Arc<dyn ReplySource>,
    request: ValidRequest,
    chunk_delay: Duration,
    cancel: CancellationToken,
}

impl CompletionProducer {
    pub fn new(source: Arc<dyn ReplySource>, request: ValidRequest) -> Self {
        Self {
            source,
            request,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_chunk_delay(mut self, chunk_delay: Duration) -> Self {
        self.chunk_delay = chunk_delay;
        self
    }

    /// Tie this producer to an outside token, usually a child of the server's
    /// shutdown token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token cancelled when the stream is dropped before finishing.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request(&self) -> &ValidRequest {
        &self.request
    }

    /// SSE payloads in emission order: one per reply line, then the
    /// terminator chunk and `[DONE]` sentinel as a single payload.
    ///
    /// If the reply source fails, one error event is yielded and the stream
    /// ends without the sentinel.
    pub fn frames(self) -> impl Stream<Item = Bytes> + Send + 'static {
        let Self {
            source,
            request,
            chunk_delay,
            cancel,
        } = self;

        async_stream::stream! {
            let mut guard = StreamGuard::new(cancel.clone());
            let started = Instant::now();
            let mut state = StreamingState::new(request.model.clone());
            let mut metrics = StreamingMetrics::new();

            debug!(model = %request.model, source = source.name(), "stream started");

            let mut lines = match unless_cancelled(&cancel, source.reply(&request)).await {
                Some(Ok(lines)) => lines,
                Some(Err(err)) => {
                    warn!(model = %request.model, "reply source failed before streaming: {}", err);
                    guard.finish();
                    yield error_frame(&err);
                    return;
                }
                None => return,
            };

            loop {
                let next = match unless_cancelled(&cancel, lines.next()).await {
                    Some(next) => next,
                    None => {
                        debug!(chunks = metrics.total_chunks, "stream cancelled");
                        return;
                    }
                };

                let content = match next {
                    Some(Ok(content)) => content,
                    Some(Err(err)) => {
                        metrics.record_error();
                        warn!(
                            model = %request.model,
                            chunks = metrics.total_chunks,
                            "reply source failed mid-stream: {}",
                            err
                        );
                        guard.finish();
                        yield error_frame(&err);
                        return;
                    }
                    None => break,
                };

                if unless_cancelled(&cancel, tokio::time::sleep(chunk_delay)).await.is_none() {
                    debug!(chunks = metrics.total_chunks, "stream cancelled");
                    return;
                }

                let frame = state.content_frame(content);
                metrics.record_chunk(frame.len());
                yield frame;
            }

            let frame = state.final_frame();
            metrics.record_chunk(frame.len());
            metrics.set_duration(started.elapsed().as_millis() as u64);
            guard.finish();

            debug!(
                model = %request.model,
                chunks = metrics.total_chunks,
                bytes = metrics.total_bytes,
                duration_ms = metrics.stream_duration_ms,
                "stream finished"
            );
            yield frame;
        }
    }

    /// Raw buffered replies. The built-in sources yield exactly one value;
    /// consumers keep the last one.
    pub fn responses(self) -> impl Stream<Item = Result<BufferedReply, ProxyError>> + Send + 'static {
        let Self { source, request, .. } = self;

        async_stream::try_stream! {
            let mut lines = source.reply(&request).await?;
            let mut parts = Vec::new();
            while let Some(line) = lines.next().await {
                parts.push(line?);
            }

            debug!(model = %request.model, lines = parts.len(), "buffered reply produced");
            yield BufferedReply::assistant(parts.join("\n"));
        }
    }
}

/// Run `fut` unless `cancel` fires first.
async fn unless_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

/// Cancels the producer's token if the stream is dropped before it finished,
/// which is what happens when the client goes away mid-response.
struct StreamGuard {
    cancel: CancellationToken,
    finished: bool,
}

impl StreamGuard {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.finished {
            if !self.cancel.is_cancelled() {
                debug!("stream dropped before completion, cancelling producer");
            }
            self.cancel.cancel();
        }
    }
}
