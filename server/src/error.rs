use std::path::PathBuf;
use thiserror::Error;

/// Startup faults. Anything here ends the process with a non-zero exit code.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cannot read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credentials file {0} has no header line")]
    MissingHeader(PathBuf),
    #[error("credentials file {0} contains no accounts")]
    NoAccounts(PathBuf),
    #[error("username {0:?} has no password")]
    MissingPassword(String),
}
