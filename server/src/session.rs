//! Per-connection protocol state machine.
//!
//! A session walks `Connecting → Authenticating → MenuSelect →
//! {PlayingGame | ViewingLeaderboard} → MenuSelect → … → Closed`. Each state
//! handler performs its reads and writes through [`Connection`] and returns
//! the next state; any [`Disconnect`] short-circuits straight to `Closed`
//! without sending anything further.

use crate::credentials::{Credential, CredentialStore};
use crate::game::{Board, GameEngine};
use crate::leaderboard::{Leaderboard, ScoreEntry};
use crate::poll_io::{Connection, Disconnect, IoResult};
use crate::shutdown::Shutdown;
use log::{debug, error, info};
use shared::{
    decode_field, Action, AuthRequest, Coordinates, MenuSelection, MoveResult, AUTH_FAILURE,
    AUTH_REQUEST_SIZE, AUTH_SUCCESS, CONNECTED, COORDINATES_SIZE, ENTRIES_END, ENTRIES_MORE,
    LEADERBOARD_EMPTY, LEADERBOARD_PRESENT,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a worker needs to serve a session, shared by the whole pool.
pub struct SessionContext {
    pub credentials: CredentialStore,
    pub leaderboard: Leaderboard,
    pub engine: Box<dyn GameEngine>,
    pub shutdown: Shutdown,
    pub poll_interval: Duration,
}

impl SessionContext {
    pub fn new(
        credentials: CredentialStore,
        engine: Box<dyn GameEngine>,
        shutdown: Shutdown,
        poll_interval: Duration,
    ) -> Self {
        Self {
            credentials,
            leaderboard: Leaderboard::new(),
            engine,
            shutdown,
            poll_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    MenuSelect,
    PlayingGame,
    ViewingLeaderboard,
    Closed,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Quit from the menu or failed to log in.
    Finished,
    Disconnected(Disconnect),
}

pub struct SessionHandler<'a> {
    conn: Connection,
    ctx: &'a SessionContext,
    worker: usize,
    state: SessionState,
    player: Option<Arc<Credential>>,
}

impl<'a> SessionHandler<'a> {
    pub fn new(conn: Connection, ctx: &'a SessionContext, worker: usize) -> Self {
        Self {
            conn,
            ctx,
            worker,
            state: SessionState::Connecting,
            player: None,
        }
    }

    /// Drives the session to `Closed` and closes the socket.
    pub fn run(mut self) -> SessionEnd {
        let end = loop {
            let next = match self.state {
                SessionState::Connecting => self.greet(),
                SessionState::Authenticating => self.authenticate(),
                SessionState::MenuSelect => self.select(),
                SessionState::PlayingGame => self.play(),
                SessionState::ViewingLeaderboard => self.show_leaderboard(),
                SessionState::Closed => break SessionEnd::Finished,
            };
            match next {
                Ok(state) => self.state = state,
                Err(reason) => {
                    self.state = SessionState::Closed;
                    break SessionEnd::Disconnected(reason);
                }
            }
        };

        info!(
            "Worker {}: closing connection {:?} ({:?})",
            self.worker,
            self.conn.peer(),
            end
        );
        self.conn.close();
        end
    }

    /// Tells a client that waited in the queue that a worker is now serving it.
    fn greet(&mut self) -> IoResult<SessionState> {
        self.conn.send_int(CONNECTED)?;
        Ok(SessionState::Authenticating)
    }

    fn authenticate(&mut self) -> IoResult<SessionState> {
        let request: AuthRequest = self.conn.read_record(AUTH_REQUEST_SIZE)?;
        let username = decode_field(&request.username);
        let password = decode_field(&request.password);

        match self.ctx.credentials.authenticate(&username, &password) {
            Some(credential) => {
                info!("Worker {}: {} logged in", self.worker, username);
                self.conn.send_int(AUTH_SUCCESS)?;
                self.player = Some(credential);
                Ok(SessionState::MenuSelect)
            }
            None => {
                info!("Worker {}: rejected login for {:?}", self.worker, username);
                self.conn.send_int(AUTH_FAILURE)?;
                Ok(SessionState::Closed)
            }
        }
    }

    fn select(&mut self) -> IoResult<SessionState> {
        let code = self.conn.read_int()?;
        Ok(match MenuSelection::from_code(code) {
            Some(MenuSelection::Play) => SessionState::PlayingGame,
            Some(MenuSelection::Leaderboard) => SessionState::ViewingLeaderboard,
            Some(MenuSelection::Quit) => SessionState::Closed,
            None => {
                debug!("Worker {}: ignoring menu selection {}", self.worker, code);
                SessionState::MenuSelect
            }
        })
    }

    fn send_board(&mut self, board: &Board) -> IoResult<()> {
        let bytes = board.snapshot().encode().map_err(|e| {
            error!("Worker {}: cannot encode board: {}", self.worker, e);
            Disconnect::Closed
        })?;
        self.conn.write_all(&bytes)
    }

    fn play(&mut self) -> IoResult<SessionState> {
        let mut board = self.ctx.engine.new_board();
        let started = Instant::now();
        self.send_board(&board)?;

        loop {
            let byte = self.conn.read_byte()?;
            let action = Action::from_byte(byte);
            if action == Some(Action::Quit) {
                debug!("Worker {}: player left the game", self.worker);
                return Ok(SessionState::MenuSelect);
            }

            let at: Coordinates = self.conn.read_record(COORDINATES_SIZE)?;
            let result = match action {
                Some(action) => board.apply(action, at),
                None => {
                    debug!("Worker {}: unknown action byte {:#04x}", self.worker, byte);
                    MoveResult::InvalidCoordinates
                }
            };

            self.conn.send_int(result.code())?;
            self.send_board(&board)?;

            match result {
                MoveResult::GameWon => {
                    let duration = started.elapsed().as_secs() as i64;
                    self.record_win(duration);
                    self.conn.send_long(duration)?;
                    return Ok(SessionState::MenuSelect);
                }
                MoveResult::GameLost => {
                    self.record_loss();
                    return Ok(SessionState::MenuSelect);
                }
                _ => {}
            }
        }
    }

    fn record_win(&self, duration: i64) {
        let Some(player) = &self.player else {
            return;
        };
        let stats = player.record_win();
        info!(
            "Worker {}: {} won in {}s ({} of {} games won)",
            self.worker,
            player.username(),
            duration,
            stats.games_won,
            stats.games_played
        );
        self.ctx
            .leaderboard
            .insert(ScoreEntry::new(Arc::clone(player), duration));
    }

    fn record_loss(&self) {
        if let Some(player) = &self.player {
            let stats = player.record_loss();
            info!(
                "Worker {}: {} lost ({} games played)",
                self.worker,
                player.username(),
                stats.games_played
            );
        }
    }

    fn show_leaderboard(&mut self) -> IoResult<SessionState> {
        let rows = self.ctx.leaderboard.rows();
        if rows.is_empty() {
            self.conn.send_int(LEADERBOARD_EMPTY)?;
            return Ok(SessionState::MenuSelect);
        }

        self.conn.send_int(LEADERBOARD_PRESENT)?;
        let last = rows.len() - 1;
        for (i, row) in rows.iter().enumerate() {
            self.conn.send_record(row)?;
            self.conn
                .send_int(if i == last { ENTRIES_END } else { ENTRIES_MORE })?;
        }
        Ok(SessionState::MenuSelect)
    }
}
