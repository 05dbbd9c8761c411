//! # Minesweeper Session Server Library
//!
//! This library provides a multi-user Minesweeper server. Clients log in
//! over TCP, then from a menu choose to play a 9x9 game, view the shared
//! leaderboard, or quit. Every game decision is made on the server; clients
//! only send actions and render the boards they receive.
//!
//! ## Core Responsibilities
//!
//! ### Session Serving
//! A fixed pool of worker threads serves sessions one at a time each. The
//! acceptor thread never blocks on a client: it only queues sockets. A client
//! that connects while every worker is busy waits in the queue until one
//! frees up, and learns it is being served from a one-int connected ack.
//!
//! ### Shared State
//! - **Credentials** are loaded once at startup. Their per-user win/play
//!   counters are the only mutable part and sit behind per-account locks.
//! - **Leaderboard** entries are inserted in rank order under a write lock
//!   while any number of readers may list it concurrently.
//!
//! ### Cooperative Shutdown
//! An interrupt sets one atomic flag. Every blocking wait in the server
//! (accepting, dequeuing, socket reads and writes) either returns on its own
//! within one poll interval or is woken by the queue closing, so the process
//! drains without forcibly killing threads.
//!
//! ## Module Organization
//!
//! ### Configuration (`config`) and Errors (`error`)
//! Listening address, pool size, credentials path, poll interval and seed,
//! plus the startup error types.
//!
//! ### Credentials Module (`credentials`)
//! Parses the credentials file and authenticates login attempts.
//!
//! ### Game Module (`game`)
//! Board generation, reveal with flood fill, flag toggling and snapshots.
//!
//! ### Leaderboard Module (`leaderboard`)
//! Ranked list of winning games.
//!
//! ### Network Module (`network`)
//! Listener creation, the accept loop, and the server lifecycle.
//!
//! ### Polling I/O (`poll_io`) and Queue (`queue`)
//! Shutdown-aware socket reads and writes, and the FIFO of pending
//! connections handed from the acceptor to the workers.
//!
//! ### Session Module (`session`)
//! The per-connection protocol state machine.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::credentials::CredentialStore;
//! use server::game::RandomBoards;
//! use server::network::Server;
//! use server::shutdown::Shutdown;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let credentials = CredentialStore::load(&config.credentials_path)?;
//!     let shutdown = Shutdown::new();
//!     shutdown.install_interrupt_handler()?;
//!
//!     let server = Server::bind(
//!         config,
//!         credentials,
//!         Box::new(RandomBoards::new(None)),
//!         shutdown,
//!     )?;
//!     // Blocks until Ctrl+C, then waits for every worker to finish.
//!     server.run()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod game;
pub mod leaderboard;
pub mod network;
pub mod poll_io;
pub mod queue;
pub mod session;
pub mod shutdown;
pub mod worker_pool;
