//! # Minesweeper Client Library
//!
//! A blocking client for the Minesweeper session protocol. It is used by the
//! scripted `client` binary and by the end-to-end tests, which drive real
//! servers over loopback.
//!
//! ## Protocol Flow
//!
//! 1. Connect, then wait for the connected ack. The server only sends it
//!    once a worker is free, so a client may sit here while others play.
//! 2. Log in with a fixed-width username and password. A rejected login is
//!    answered with a failure code and the connection is closed.
//! 3. Loop over the menu: play a game, list the leaderboard, or quit.
//!
//! During a game every reveal or flag is answered with a result code and the
//! full board; a winning move is additionally followed by the time taken.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! [`network::GameClient`] with one method per protocol request, and the
//! [`network::ClientError`] type.
//!
//! ### Input Module (`input`)
//! Parses typed moves like `R A1` into [`input::MoveCommand`].
//!
//! ### Rendering Module (`rendering`)
//! Text rendering of boards, move results and the leaderboard.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::GameClient;
//! use shared::Action;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = GameClient::connect("127.0.0.1:12345")?;
//!     if !client.login("alice", "secret")? {
//!         return Ok(());
//!     }
//!     let board = client.start_game()?;
//!     println!("{}", client::rendering::render_board(&board));
//!
//!     let outcome = client.make_move(Action::Reveal, b'A', 1)?;
//!     println!("{:?}", outcome.result);
//!     if !outcome.result.ends_game() {
//!         client.quit_game()?;
//!     }
//!     client.quit()?;
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
pub mod rendering;
