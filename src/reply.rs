//! # Reply Sources
//!
//! The producer never hardcodes what it says. It asks a [`ReplySource`] for a
//! stream of content units (one per line) and handles pacing and framing
//! itself, so a real inference backend can replace [`CannedReply`] without
//! touching the wire format.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};

use crate::{error::ProxyError, mode::ValidRequest};

/// The placeholder reply every request gets by default.
pub const CANNED_REPLY: &str = "Hello world is another\n  message that used to be the starter \n  programmmer to start learning";

/// Ordered content units for one request.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ProxyError>> + Send>>;

/// Anything that can produce reply content for a validated request.
#[async_trait]
pub trait ReplySource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Start a reply. Each item is one line of the reply, without its newline.
    async fn reply(&self, request: &ValidRequest) -> Result<ReplyStream, ProxyError>;
}

/// Fixed text split on `\n`.
#[derive(Debug, Clone)]
pub struct CannedReply {
    text: String,
}

impl CannedReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lines in emission order; joining them with `\n` gives back the text.
    pub fn lines(&self) -> Vec<String> {
        self.text.split('\n').map(str::to_string).collect()
    }
}

impl Default for CannedReply {
    fn default() -> Self {
        Self::new(CANNED_REPLY)
    }
}

#[async_trait]
impl ReplySource for CannedReply {
    fn name(&self) -> &str {
        "canned"
    }

    async fn reply(&self, _request: &ValidRequest) -> Result<ReplyStream, ProxyError> {
        let lines = self.lines().into_iter().map(Ok::<String, ProxyError>);
        Ok(Box::pin(stream::iter(lines)))
    }
}
