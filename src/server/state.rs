//! # Application State
//!
//! Shared, read-only state passed to every handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{config::Config, reply::ReplySource};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Where completion content comes from
    reply_source: Arc<dyn ReplySource>,
    /// Root shutdown token; each stream runs on a child of it
    shutdown: CancellationToken,
}

impl AppState {
    /// State with the reply source described by `config`.
    pub fn new(config: Config) -> Self {
        let reply_source: Arc<dyn ReplySource> = Arc::new(config.reply_source());
        Self {
            config,
            reply_source,
            shutdown: CancellationToken::new(),
        }
    }

    /// Swap in another reply source, e.g. a real backend.
    pub fn with_reply_source(mut self, reply_source: Arc<dyn ReplySource>) -> Self {
        self.reply_source = reply_source;
        self
    }

    /// Tie in-flight streams to the server's shutdown token.
    pub fn with_shutdown_token(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reply_source(&self) -> Arc<dyn ReplySource> {
        self.reply_source.clone()
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
