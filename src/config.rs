#[cfg(feature = "cli")]
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::reply::{CannedReply, CANNED_REPLY};

/// Longest pacing delay `validate` accepts.
const MAX_CHUNK_DELAY_MS: u64 = 60_000;

/// # Server Configuration
///
/// Command-line arguments and environment variables, with `.env` loading
/// in the CLI build.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "dummy-completions"))]
#[cfg_attr(feature = "cli", command(about = "Mock OpenAI-compatible chat completions server streaming a canned reply"))]
#[cfg_attr(feature = "cli", command(version))]
pub struct Config {
    // =============================================================================
    // CORE SERVER CONFIGURATION
    // =============================================================================

    /// Server port to listen on
    #[cfg_attr(feature = "cli", arg(short, long, env = "PORT", default_value = "5007"))]
    pub port: u16,

    /// Server host to bind to
    #[cfg_attr(feature = "cli", arg(long, env = "HOST", default_value = "0.0.0.0"))]
    pub host: String,

    /// Seconds to wait for open connections after a shutdown signal
    #[cfg_attr(feature = "cli", arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value = "30"))]
    pub shutdown_timeout_secs: u64,

    // =============================================================================
    // COMPLETION SIMULATION
    // =============================================================================

    /// Model name echoed back when a request doesn't name one
    #[cfg_attr(feature = "cli", arg(long, env = "DEFAULT_MODEL", default_value = "dummy-model"))]
    pub default_model: String,

    /// Pause before each streamed chunk, in milliseconds
    #[cfg_attr(feature = "cli", arg(long, env = "CHUNK_DELAY_MS", default_value = "256"))]
    pub chunk_delay_ms: u64,

    /// Replace the canned reply (lines are split on '\n')
    #[cfg_attr(feature = "cli", arg(long, env = "REPLY_TEXT"))]
    pub reply_text: Option<String>,

    // =============================================================================
    // LOGGING
    // =============================================================================

    /// Log level (error, warn, info, debug, trace)
    #[cfg_attr(feature = "cli", arg(long, env = "LOG_LEVEL", default_value = "info"))]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[cfg_attr(feature = "cli", arg(long, env = "ENVIRONMENT", default_value = "development"))]
    pub environment: String,
}

impl Config {
    /// Parse configuration from command line arguments and environment variables.
    ///
    /// Loads `.env` first, then sets up logging, then validates. Exits the
    /// process when validation fails.
    #[cfg(feature = "cli")]
    pub fn parse_args() -> Self {
        // Load .env file if it exists (ignore errors if file doesn't exist)
        let _ = dotenv::dotenv();

        let config = Self::parse();

        config.setup_logging();

        if let Err(err) = config.validate() {
            eprintln!("Configuration validation failed: {}", err);
            std::process::exit(1);
        }

        config
    }

    /// Create a test configuration: loopback host, ephemeral port, default pacing.
    pub fn for_test() -> Self {
        Self {
            port: 0,
            host: "127.0.0.1".to_string(),
            shutdown_timeout_secs: 5,
            default_model: "dummy-model".to_string(),
            chunk_delay_ms: 256,
            reply_text: None,
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Reply source built from `reply_text`, or the canned reply.
    pub fn reply_source(&self) -> CannedReply {
        CannedReply::new(self.reply_text.as_deref().unwrap_or(CANNED_REPLY))
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let host = if self.host == "localhost" { "127.0.0.1" } else { self.host.as_str() };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|err| format!("Invalid bind address '{}:{}': {}", self.host, self.port, err))
    }

    /// Set up the tracing subscriber from `log_level`.
    #[cfg(feature = "cli")]
    fn setup_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(&self.log_level)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .try_init();
    }

    /// Validate configuration values and provide helpful error messages.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0. Please specify a valid port number (1-65535).".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty. Please specify a valid host (e.g., '0.0.0.0', 'localhost', or an IP address).".to_string());
        }
        self.bind_addr()?;

        if self.default_model.trim().is_empty() {
            return Err("Default model cannot be empty.".to_string());
        }

        if self.chunk_delay_ms > MAX_CHUNK_DELAY_MS {
            return Err(format!(
                "Chunk delay of {}ms is too long. Use at most {}ms.",
                self.chunk_delay_ms, MAX_CHUNK_DELAY_MS
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err("Shutdown timeout must be greater than 0 seconds.".to_string());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid options are: {}",
                self.log_level,
                valid_log_levels.join(", ")
            ));
        }

        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.as_str()) {
            return Err(format!(
                "Invalid environment '{}'. Valid options are: {}",
                self.environment,
                valid_environments.join(", ")
            ));
        }

        if self.environment == "production" && (self.log_level == "debug" || self.log_level == "trace") {
            eprintln!(
                "⚠️  Warning: Using debug/trace logging in production logs every streamed chunk."
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5007,
            host: "0.0.0.0".to_string(),
            ..Self::for_test()
        }
    }
}
