//! # Graceful Shutdown Module
//!
//! Shutdown is a single [`CancellationToken`]. Every in-flight stream holds a
//! child of it, so cancelling the root on SIGINT/SIGTERM stops all pacing
//! loops at once and lets the server drain quickly.
//!
//! ## Shutdown Process:
//!
//! 1. **Signal Reception**: SIGINT, SIGTERM or SIGQUIT cancels the root token
//! 2. **Stop Accepting**: axum stops accepting new connections
//! 3. **Drain Connections**: open responses finish, bounded by a timeout
//! 4. **Exit**: the process exits cleanly

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// # Graceful Shutdown Manager
#[derive(Clone)]
pub struct GracefulShutdown {
    token: CancellationToken,
    shutdown_complete: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Root token; hand children of it to per-request work.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Relaxed)
    }

    pub fn initiate_shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("🛑 Graceful shutdown initiated");
        }
        self.token.cancel();
    }

    pub fn complete_shutdown(&self) {
        info!("✅ Graceful shutdown completed");
        self.shutdown_complete.store(true, Ordering::Relaxed);
    }

    /// Resolves once shutdown was initiated.
    pub fn initiated(&self) -> impl Future<Output = ()> + Send + 'static {
        let token = self.token.clone();
        async move { token.cancelled().await }
    }

    /// # Wait for shutdown signal
    ///
    /// Waits for SIGINT, SIGTERM or SIGQUIT (only SIGINT off unix) and
    /// initiates shutdown. Returns early if shutdown was initiated elsewhere.
    pub async fn wait_for_shutdown_signal(&self) -> std::io::Result<()> {
        info!("🔍 Waiting for shutdown signal...");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigquit = signal::unix::signal(signal::unix::SignalKind::quit())?;

            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    info!("📡 Received SIGINT (Ctrl+C)");
                }
                _ = sigterm.recv() => info!("📡 Received SIGTERM"),
                _ = sigquit.recv() => info!("📡 Received SIGQUIT"),
                _ = self.token.cancelled() => return Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    info!("📡 Received Ctrl+C");
                }
                _ = self.token.cancelled() => return Ok(()),
            }
        }

        self.initiate_shutdown();
        Ok(())
    }

    /// Spawn a task that turns OS signals into shutdown.
    pub fn spawn_signal_handler(&self) -> tokio::task::JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown.wait_for_shutdown_signal().await {
                error!("❌ Error waiting for shutdown signal: {}", e);
            }
        })
    }

    /// # Drive a server until it drains
    ///
    /// Awaits `server` to completion. Once shutdown is initiated the server
    /// gets `drain_timeout` to finish open connections before it is dropped.
    pub async fn run_until_drained<F>(&self, drain_timeout: Duration, server: F) -> std::io::Result<()>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result?,
            _ = self.token.cancelled() => {
                info!("🛑 Draining connections (timeout: {:?})", drain_timeout);
                match timeout(drain_timeout, &mut server).await {
                    Ok(result) => result?,
                    Err(_) => warn!("⏰ Drain timeout exceeded, forcing shutdown"),
                }
            }
        }

        self.complete_shutdown();
        Ok(())
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}
