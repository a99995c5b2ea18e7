//! # Completions Endpoint Tests
//!
//! Drive the router in-process with `oneshot`. Tokio time is paused, so the
//! pacing delay auto-advances and streamed tests finish instantly while the
//! elapsed virtual time still reflects the pacing.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use dummy_completions::{
    create_router,
    reply::ReplyStream,
    schemas::CompletionChunk,
    streaming::{data_payloads, DONE_PAYLOAD},
    AppState, Config, ProxyError, ReplySource, ValidRequest, CANNED_REPLY, DEFAULT_CHUNK_DELAY,
};
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};
use tokio::time::Instant;
use tower::ServiceExt;

fn create_test_app() -> Router {
    create_router(AppState::new(Config::for_test()))
}

fn completion_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn post_json(app: Router, body: Value) -> axum::response::Response {
    let request = completion_request("/v1/chat/completions", serde_json::to_vec(&body).unwrap());
    app.oneshot(request).await.unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Decode every chunk payload, skipping the `[DONE]` sentinel.
fn chunks(body: &str) -> Vec<CompletionChunk> {
    data_payloads(body)
        .into_iter()
        .filter(|payload| *payload != DONE_PAYLOAD)
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect()
}

/// Yields `good` lines, then fails.
struct FlakyBackend {
    good: usize,
}

#[async_trait]
impl ReplySource for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn reply(&self, _request: &ValidRequest) -> Result<ReplyStream, ProxyError> {
        let mut items: Vec<Result<String, ProxyError>> =
            (0..self.good).map(|i| Ok(format!("partial {}", i))).collect();
        items.push(Err(ProxyError::Upstream("model crashed".to_string())));
        Ok(Box::pin(stream::iter(items)))
    }
}

#[tokio::test(start_paused = true)]
async fn test_buffered_chat_document() {
    let response = post_json(create_test_app(), json!({"model": "demo", "stream": false})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().contains("application/json"));

    let document = body_json(response).await;
    assert_eq!(document["object"], "chat.completion");
    assert_eq!(document["model"], "demo");
    assert!(document["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert!(document["created"].is_i64());

    let choices = document["choices"].as_array().unwrap();
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0]["index"], 0);
    assert_eq!(choices[0]["message"]["role"], "assistant");
    assert_eq!(choices[0]["message"]["content"], CANNED_REPLY);
    assert_eq!(choices[0]["finish_reason"], "stop");
}

#[tokio::test(start_paused = true)]
async fn test_buffered_is_not_paced() {
    let started = Instant::now();
    let response = post_json(create_test_app(), json!({"model": "demo", "stream": false})).await;
    body_string(response).await;

    assert!(started.elapsed() < DEFAULT_CHUNK_DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_buffered_prompt_document() {
    let response = post_json(
        create_test_app(),
        json!({"model": "demo", "prompt": ["hi"], "stream": false}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let document = body_json(response).await;
    let choice = &document["choices"][0];

    assert_eq!(choice["text"], CANNED_REPLY);
    assert_eq!(choice["role"], "assistant");
    assert_eq!(choice["finish_reason"], "stop");
    assert!(choice.get("message").is_none());
    assert_eq!(document["object"], "chat.completion");
}

#[tokio::test(start_paused = true)]
async fn test_string_prompt_is_chat_mode() {
    let response = post_json(
        create_test_app(),
        json!({"model": "demo", "prompt": "hi", "stream": false}),
    )
    .await;

    let document = body_json(response).await;
    assert_eq!(document["choices"][0]["message"]["content"], CANNED_REPLY);
    assert!(document["choices"][0].get("text").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_streaming_headers_and_framing() {
    let response = post_json(create_test_app(), json!({"model": "demo", "stream": true})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/event-stream");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    assert_eq!(headers.get(header::CONNECTION).unwrap(), "keep-alive");

    let body = body_string(response).await;
    assert!(body.starts_with("data: "));
    assert!(body.ends_with("data: [DONE]\n\n"));
    assert_eq!(data_payloads(&body).iter().filter(|p| **p == DONE_PAYLOAD).count(), 1);

    let chunks = chunks(&body);
    let lines: Vec<&str> = CANNED_REPLY.split('\n').collect();
    assert_eq!(chunks.len(), lines.len() + 1);

    for (i, chunk) in chunks[..lines.len()].iter().enumerate() {
        assert_eq!(chunk.index, i);
        assert_eq!(chunk.content(), lines[i]);
        assert_eq!(chunk.finish_reason, None);
        assert_eq!(chunk.object, "chat.completion.chunk");
        assert_eq!(chunk.model, "demo");
        assert!(chunk.id.starts_with("chatcmpl-"));
        assert!(chunk.done);
    }

    let terminator = chunks.last().unwrap();
    assert_eq!(terminator.index, lines.len());
    assert_eq!(terminator.finish_reason.as_deref(), Some("done"));
    assert_eq!(terminator.content(), "");
}

#[tokio::test(start_paused = true)]
async fn test_streamed_content_reconstructs_reply() {
    let response = post_json(create_test_app(), json!({"model": "demo", "stream": true})).await;
    let body = body_string(response).await;
    let chunks = chunks(&body);

    let content: Vec<&str> = chunks[..chunks.len() - 1].iter().map(|c| c.content()).collect();
    assert_eq!(content.join("\n"), CANNED_REPLY);
}

#[tokio::test(start_paused = true)]
async fn test_stream_defaults_when_flag_missing_or_not_boolean() {
    for body in [json!({"model": "demo"}), json!({"model": "demo", "stream": "false"}), json!({"model": "demo", "stream": 0})] {
        let response = post_json(create_test_app(), body.clone()).await;
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap().clone();
        assert_eq!(content_type, "text/event-stream", "body={}", body);
        assert!(body_string(response).await.ends_with("data: [DONE]\n\n"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_frames_arrive_one_per_line_with_pacing() {
    let response = post_json(create_test_app(), json!({"model": "demo"})).await;
    let started = Instant::now();
    let mut frames = response.into_body().into_data_stream();

    let mut arrivals = Vec::new();
    while let Some(frame) = frames.next().await {
        arrivals.push((started.elapsed(), frame.unwrap()));
    }

    assert_eq!(arrivals.len(), 4);
    for (i, (elapsed, frame)) in arrivals[..3].iter().enumerate() {
        assert!(*elapsed >= DEFAULT_CHUNK_DELAY * (i as u32 + 1));
        let payloads = data_payloads(std::str::from_utf8(frame).unwrap());
        assert_eq!(payloads.len(), 1);
    }

    // Terminator and sentinel travel in the same frame.
    let last = std::str::from_utf8(&arrivals[3].1).unwrap();
    assert_eq!(data_payloads(last).len(), 2);
    assert!(last.ends_with("data: [DONE]\n\n"));
}

#[tokio::test(start_paused = true)]
async fn test_prompt_mode_streaming_keeps_chat_delta_shape() {
    let response = post_json(create_test_app(), json!({"model": "demo", "prompt": ["hi"], "stream": true})).await;
    let body = body_string(response).await;

    for payload in data_payloads(&body).into_iter().filter(|p| *p != DONE_PAYLOAD) {
        let value: Value = serde_json::from_str(payload).unwrap();
        assert!(value["choices"][0]["delta"]["content"].is_string());
        assert!(value["choices"][0].get("text").is_none());
        assert_eq!(value["object"], "chat.completion.chunk");
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_model_uses_default() {
    let response = post_json(create_test_app(), json!({"stream": false})).await;
    let document = body_json(response).await;
    assert_eq!(document["model"], "dummy-model");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = completion_request("/v1/chat/completions", "{not json");
    let response = create_test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let envelope = body_json(response).await;
    assert_eq!(envelope["success"], false);
    assert!(envelope["error"].as_str().unwrap().contains("Invalid JSON body"));
}

#[tokio::test]
async fn test_non_object_and_bad_model_rejected() {
    for body in [json!([1, 2, 3]), json!("hello"), json!({"model": 42}), json!({"model": ["a"]})] {
        let response = post_json(create_test_app(), body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body={}", body);
        assert_eq!(body_json(response).await["success"], false);
    }
}

#[tokio::test(start_paused = true)]
async fn test_legacy_completions_route() {
    let request = completion_request(
        "/v1/completions",
        serde_json::to_vec(&json!({"model": "demo", "prompt": ["hi"], "stream": false})).unwrap(),
    );
    let response = create_test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["choices"][0]["text"], CANNED_REPLY);
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let request = Request::builder().uri("/v1/nope").body(Body::empty()).unwrap();
    let response = create_test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"success": false, "error": "Route not found"}));
}

#[tokio::test]
async fn test_root_and_health() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = create_test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let root = body_json(response).await;
    assert_eq!(root["success"], true);
    assert_eq!(root["message"], "Chat Backend API is running!");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = create_test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test(start_paused = true)]
async fn test_custom_reply_text() {
    let mut config = Config::for_test();
    config.reply_text = Some("first\nsecond".to_string());
    let app = create_router(AppState::new(config));

    let body = body_string(post_json(app, json!({"model": "demo"})).await).await;
    let contents: Vec<String> = chunks(&body).iter().map(|c| c.content().to_string()).collect();
    assert_eq!(contents, vec!["first", "second", ""]);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failure_mid_stream() {
    let state = AppState::new(Config::for_test()).with_reply_source(Arc::new(FlakyBackend { good: 2 }));
    let response = post_json(create_router(state), json!({"model": "demo"})).await;

    // Headers were already committed; the failure shows up in the body.
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    let payloads = data_payloads(&body);

    assert_eq!(payloads.len(), 3);
    assert!(!body.contains("[DONE]"));
    let error: Value = serde_json::from_str(payloads[2]).unwrap();
    assert_eq!(error["error"]["type"], "api_error");
}

#[tokio::test]
async fn test_upstream_failure_buffered() {
    let state = AppState::new(Config::for_test()).with_reply_source(Arc::new(FlakyBackend { good: 1 }));
    let response = post_json(create_router(state), json!({"model": "demo", "stream": false})).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let envelope = body_json(response).await;
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"], "model crashed");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_open_streams() {
    let shutdown = tokio_util::sync::CancellationToken::new();
    let state = AppState::new(Config::for_test()).with_shutdown_token(shutdown.clone());
    let response = post_json(create_router(state), json!({"model": "demo"})).await;
    let mut frames = response.into_body().into_data_stream();

    assert!(frames.next().await.is_some());
    shutdown.cancel();
    assert!(frames.next().await.is_none());
}
