//! # Transport Adapters
//!
//! The two ways a producer reaches the client: raw SSE bytes written as they
//! are produced, or one JSON document after the producer is drained.

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{self, header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::StreamExt;

use crate::{
    error::ProxyError,
    streaming::{buffered::collect_document, producer::CompletionProducer},
};

pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Stream the producer's frames as a `text/event-stream` body.
///
/// Frames are handed to hyper one at a time, unmodified; the next frame is
/// only produced once the previous one was taken. Prompt mode does not
/// change the chunk shape here.
pub fn sse_response(producer: CompletionProducer) -> Result<Response, ProxyError> {
    let frames = producer.frames().map(Ok::<Bytes, Infallible>);

    let response = http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(frames))?;

    Ok(response)
}

/// Drain the producer and answer with one completion document.
pub async fn json_response(producer: CompletionProducer) -> Result<Response, ProxyError> {
    let model = producer.request().model.clone();
    let prompt_mode = producer.request().modes.prompt_mode;

    let document = collect_document(producer.responses(), &model, prompt_mode).await?;
    Ok((StatusCode::OK, Json(document)).into_response())
}
