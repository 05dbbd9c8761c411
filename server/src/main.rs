use clap::Parser;
use log::{error, info};
use server::config::{
    ServerConfig, DEFAULT_CREDENTIALS_FILE, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS,
};
use server::credentials::CredentialStore;
use server::error::ServerError;
use server::game::RandomBoards;
use server::network::Server;
use server::shutdown::Shutdown;
use shared::DEFAULT_PORT;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-user Minesweeper server")]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Credentials file: a header line followed by username/password pairs
    #[arg(short, long, default_value = DEFAULT_CREDENTIALS_FILE)]
    credentials: PathBuf,

    /// Number of worker threads, i.e. concurrent sessions
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// How often blocked threads re-check for shutdown, in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,

    /// Seed for mine placement, for reproducible boards
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        workers: args.workers,
        credentials_path: args.credentials,
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        seed: args.seed,
    };

    if let Err(e) = run(config) {
        error!("Server error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

/// Any error here is a startup fault; `main` returning it exits with code 1.
fn run(config: ServerConfig) -> Result<(), ServerError> {
    let credentials = CredentialStore::load(&config.credentials_path)?;
    let shutdown = Shutdown::new();

    let engine = Box::new(RandomBoards::new(config.seed));
    let server = Server::bind(config, credentials, engine, shutdown.clone())?;
    shutdown.install_interrupt_handler()?;
    server.run()?;

    info!("Server stopped");
    Ok(())
}
