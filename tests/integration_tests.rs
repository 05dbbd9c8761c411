//! End-to-end tests: real servers on loopback driven by the client library.
//!
//! Each test binds its own server on an ephemeral port with a short poll
//! interval, so tests run in parallel and shut down quickly.

use client::network::{ClientError, GameClient};
use server::config::ServerConfig;
use server::credentials::CredentialStore;
use server::game::{FixedLayout, GameEngine, RandomBoards};
use server::network::Server;
use server::session::SessionContext;
use server::shutdown::Shutdown;
use shared::{Action, MoveResult, MINE_COUNT, TILE_COUNT};
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::NamedTempFile;

const POLL: Duration = Duration::from_millis(10);

/// PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    /// A credentials file is loaded and checked exactly, password included
    #[test]
    fn login_against_credentials_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Username\tPassword").unwrap();
        writeln!(file, "alice\tsecret").unwrap();
        writeln!(file, "bob\thunter2").unwrap();
        let credentials = CredentialStore::load(file.path()).unwrap();
        let server = TestServer::start(credentials, Box::new(RandomBoards::new(Some(3))), 2);

        let mut client = GameClient::connect(server.addr).unwrap();
        assert!(client.login("alice", "secret").unwrap());
        client.quit().unwrap();

        let mut client = GameClient::connect(server.addr).unwrap();
        assert!(!client.login("alice", "wrong").unwrap());
        client.wait_for_close().unwrap();

        let mut client = GameClient::connect(server.addr).unwrap();
        assert!(!client.login("mallory", "secret").unwrap());

        server.stop();
    }

    /// A fresh server reports an empty leaderboard
    #[test]
    fn empty_leaderboard() {
        let server = TestServer::start(accounts(), Box::new(RandomBoards::new(None)), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        assert!(client.login("alice", "secret").unwrap());
        assert!(client.leaderboard().unwrap().is_empty());
        client.quit().unwrap();

        server.stop();
    }

    /// Unknown action bytes and out-of-range tiles leave the board untouched
    #[test]
    fn malformed_moves_are_rejected() {
        let server = TestServer::start(accounts(), wall_engine(), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        client.login("alice", "secret").unwrap();
        client.start_game().unwrap();

        client.send_action(b'X', b'A', 1).unwrap();
        let outcome = client.read_outcome().unwrap();
        assert_eq!(outcome.result, MoveResult::InvalidCoordinates);
        assert_eq!(outcome.board.revealed_count(), 0);

        for (row, column) in [(b'J', 1), (b'A', 0), (b'A', 10), (b'a', 1)] {
            let outcome = client.make_move(Action::Reveal, row, column).unwrap();
            assert_eq!(outcome.result, MoveResult::InvalidCoordinates);
        }

        client.quit_game().unwrap();
        client.quit().unwrap();
        server.stop();
    }

    /// Unknown menu codes are ignored and the menu keeps working
    #[test]
    fn unknown_menu_code_ignored() {
        let server = TestServer::start(accounts(), Box::new(RandomBoards::new(None)), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        client.login("alice", "secret").unwrap();
        client.select_code(7).unwrap();
        client.select_code(-1).unwrap();
        assert!(client.leaderboard().unwrap().is_empty());
        client.quit().unwrap();

        server.stop();
    }
}

/// GAME FLOW TESTS
mod game_tests {
    use super::*;

    /// Revealing a mine loses, exposes the whole board and counts the game
    #[test]
    fn reveal_mine_loses_game() {
        let server = TestServer::start(accounts(), wall_engine(), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        client.login("alice", "secret").unwrap();
        let board = client.start_game().unwrap();
        assert_eq!(board.mines_remaining, MINE_COUNT as i32);
        assert_eq!(board.revealed_count(), 0);

        let outcome = client.make_move(Action::Reveal, b'E', 5).unwrap();
        assert_eq!(outcome.result, MoveResult::GameLost);
        assert_eq!(outcome.duration, None);
        assert_eq!(outcome.board.revealed_count(), TILE_COUNT);
        assert!(outcome.board.tile(4, 4).is_mine);

        assert!(client.leaderboard().unwrap().is_empty());
        client.quit().unwrap();

        let alice = server.ctx.credentials.find("alice").unwrap();
        assert_eq!(alice.stats().games_played, 1);
        assert_eq!(alice.stats().games_won, 0);
        server.stop();
    }

    /// A zero tile opens its connected region but never a mine
    #[test]
    fn flood_reveal_opens_region() {
        let server = TestServer::start(accounts(), wall_engine(), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        client.login("alice", "secret").unwrap();
        client.start_game().unwrap();

        let outcome = client.make_move(Action::Reveal, b'I', 1).unwrap();
        assert_eq!(outcome.result, MoveResult::Normal);
        let board = outcome.board;
        assert!(board.revealed_count() > 1);
        assert!(board.tile(8, 3).revealed);
        assert_eq!(board.tile(8, 3).adjacent_mines, 2);
        assert!(!board.tile(0, 0).revealed);
        assert!(board.tiles.iter().all(|t| !(t.revealed && t.is_mine)));
        assert!(!board.tile(8, 5).revealed);

        let again = client.make_move(Action::Reveal, b'I', 1).unwrap();
        assert_eq!(again.result, MoveResult::TileAlreadyRevealed);

        client.quit_game().unwrap();
        client.quit().unwrap();
        server.stop();
    }

    /// Winning records the time and shows up for every player
    #[test]
    fn win_appears_on_leaderboard() {
        let server = TestServer::start(accounts(), wall_engine(), 2);

        let mut bob = GameClient::connect(server.addr).unwrap();
        bob.login("bob", "hunter2").unwrap();
        let duration = win_wall_game(&mut bob);
        assert!(duration >= 0);

        let mut alice = GameClient::connect(server.addr).unwrap();
        alice.login("alice", "secret").unwrap();
        let rows = alice.leaderboard().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username(), "bob");
        assert_eq!(rows[0].duration, duration);
        assert_eq!(rows[0].games_won, 1);
        assert_eq!(rows[0].games_played, 1);

        alice.quit().unwrap();
        bob.quit().unwrap();
        server.stop();
    }

    /// Quitting mid-game returns to the menu without touching stats
    #[test]
    fn quit_game_keeps_stats() {
        let server = TestServer::start(accounts(), wall_engine(), 1);

        let mut client = GameClient::connect(server.addr).unwrap();
        client.login("alice", "secret").unwrap();
        client.start_game().unwrap();
        client.make_move(Action::Flag, b'A', 1).unwrap();
        client.quit_game().unwrap();

        let board = client.start_game().unwrap();
        assert_eq!(board.mines_remaining, MINE_COUNT as i32);
        assert!(board.tiles.iter().all(|t| !t.flagged));
        client.quit_game().unwrap();
        client.quit().unwrap();

        let alice = server.ctx.credentials.find("alice").unwrap();
        assert_eq!(alice.stats().games_played, 0);
        server.stop();
    }
}

/// WORKER POOL AND SHUTDOWN TESTS
mod pool_tests {
    use super::*;

    /// With every worker busy, the next client waits for a free one
    #[test]
    fn third_client_waits_for_free_worker() {
        let server = TestServer::start(accounts(), Box::new(RandomBoards::new(None)), 2);

        let mut first = GameClient::connect(server.addr).unwrap();
        first.login("alice", "secret").unwrap();
        let mut second = GameClient::connect(server.addr).unwrap();
        second.login("bob", "hunter2").unwrap();

        let mut third = GameClient::connect_queued(server.addr).unwrap();
        third.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
        assert!(matches!(third.wait_until_served(), Err(ClientError::Io(_))));

        first.quit().unwrap();
        third.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        third.wait_until_served().unwrap();
        assert!(third.login("alice", "secret").unwrap());

        third.quit().unwrap();
        second.quit().unwrap();
        server.stop();
    }

    /// Shutdown ends idle sessions and drops clients still in the queue
    #[test]
    fn shutdown_releases_sessions_and_queue() {
        let server = TestServer::start(accounts(), Box::new(RandomBoards::new(None)), 1);

        let mut active = GameClient::connect(server.addr).unwrap();
        active.login("alice", "secret").unwrap();
        let mut queued = GameClient::connect_queued(server.addr).unwrap();
        // Let the acceptor move the second socket into the queue.
        thread::sleep(Duration::from_millis(100));

        server.stop();

        active.wait_for_close().unwrap();
        queued.wait_for_close().unwrap();
    }

    /// Idle workers exit promptly when nothing was ever queued
    #[test]
    fn shutdown_with_no_clients() {
        let server = TestServer::start(accounts(), Box::new(RandomBoards::new(None)), 4);
        server.stop();
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Shutdown,
    ctx: Arc<SessionContext>,
    handle: JoinHandle<()>,
}

impl TestServer {
    fn start(credentials: CredentialStore, engine: Box<dyn GameEngine>, workers: usize) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            workers,
            poll_interval: POLL,
            ..ServerConfig::default()
        };
        let shutdown = Shutdown::new();
        let server = Server::bind(config, credentials, engine, shutdown.clone()).unwrap();
        let addr = server.local_addr().unwrap();
        let ctx = server.context();
        let handle = thread::spawn(move || server.run().unwrap());
        Self {
            addr,
            shutdown,
            ctx,
            handle,
        }
    }

    fn stop(self) {
        self.shutdown.trigger();
        self.handle.join().unwrap();
    }
}

fn accounts() -> CredentialStore {
    CredentialStore::from_accounts([("alice", "secret"), ("bob", "hunter2")])
}

/// Mines fill column 5 plus A1.
fn wall_mines() -> Vec<(usize, usize)> {
    let mut mines: Vec<_> = (0..9).map(|row| (row, 4)).collect();
    mines.push((0, 0));
    mines
}

fn wall_engine() -> Box<dyn GameEngine> {
    Box::new(FixedLayout::new(wall_mines()))
}

/// Plays a wall-layout game to a win and returns the reported duration.
fn win_wall_game(client: &mut GameClient) -> i64 {
    client.start_game().unwrap();
    let mines = wall_mines();
    for (i, &(row, column)) in mines.iter().enumerate() {
        let outcome = client
            .make_move(Action::Flag, b'A' + row as u8, column as i32 + 1)
            .unwrap();
        if i + 1 < mines.len() {
            assert_eq!(outcome.result, MoveResult::Normal);
        } else {
            assert_eq!(outcome.result, MoveResult::GameWon);
            assert_eq!(outcome.board.mines_remaining, 0);
            return outcome.duration.unwrap();
        }
    }
    unreachable!("wall layout has mines")
}
