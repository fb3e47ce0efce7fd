//! Command-line and environment configuration for the server binary.

use std::time::Duration;

use clap::Parser;

use crate::infrastructure::repository::inmemory::message::DEFAULT_MESSAGE_CAPACITY;

/// Anonymous one-to-one chat matchmaking server.
#[derive(Debug, Clone, Parser)]
#[command(name = "tandem-server", version, about, long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TANDEM_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TANDEM_PORT", default_value = "8080")]
    pub port: u16,

    /// Token verification endpoint. Without it every connection is a guest.
    #[arg(long, env = "TANDEM_VERIFIER_URL")]
    pub verifier_url: Option<String>,

    /// Timeout of one verification request in milliseconds
    #[arg(long, env = "TANDEM_VERIFIER_TIMEOUT_MS", default_value = "3000")]
    pub verifier_timeout_ms: u64,

    /// Number of chat messages kept by the in-memory message store, oldest evicted first
    #[arg(long, env = "TANDEM_MESSAGE_CAPACITY", default_value_t = DEFAULT_MESSAGE_CAPACITY)]
    pub message_capacity: usize,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, env = "TANDEM_LOG_LEVEL", default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }
}
