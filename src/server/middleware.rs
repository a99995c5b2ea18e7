//! Request logging and panic handling.

use std::any::Any;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::error::ProxyError;

/// Log `--> METHOD uri` on the way in and `<-- METHOD uri status Nms` on the
/// way out. For streams the time is until headers, not until the last chunk.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    info!("--> {} {}", method, uri);

    let response = next.run(request).await;

    info!(
        "<-- {} {} {} {}ms",
        method,
        uri,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    response
}

/// Turn a handler panic into the generic 500 envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("handler panicked: {}", detail);

    ProxyError::Internal("Internal server error".to_string()).into_response()
}
