use crate::error::ServerError;
use shared::DEFAULT_PORT;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Number of worker threads, and so the number of concurrent sessions.
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);
pub const DEFAULT_CREDENTIALS_FILE: &str = "Authentication.txt";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub credentials_path: PathBuf,
    /// Upper bound on how long any blocking wait goes without re-checking
    /// the shutdown flag.
    pub poll_interval: Duration,
    /// Fixed RNG seed for reproducible boards; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            poll_interval: DEFAULT_POLL_INTERVAL,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.workers == 0 {
            return Err(ServerError::Config("worker pool needs at least one thread".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ServerError::Config("poll interval must be non-zero".into()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::Config(format!("invalid address {}:{}", self.host, self.port)))
    }
}
