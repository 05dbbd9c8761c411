use bincode::serialize;
use log::{debug, info};
use shared::{
    decode, decode_int, decode_long, Action, AuthRequest, BoardSnapshot, Coordinates,
    LeaderboardRow, MenuSelection, MoveResult, WireError, AUTH_SUCCESS, CONNECTED, ENTRIES_MORE,
    INT_SIZE, LEADERBOARD_EMPTY, LEADERBOARD_ROW_SIZE, LONG_SIZE, SNAPSHOT_SIZE,
};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server closed the connection")]
    Disconnected,
    #[error("network error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Wire(#[from] WireError),
    #[error("unexpected reply: {0}")]
    Protocol(String),
}

/// Server reply to one reveal or flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub result: MoveResult,
    pub board: BoardSnapshot,
    /// Seconds taken, present only when the move won the game.
    pub duration: Option<i64>,
}

/// Blocking protocol client. Each method sends one request and reads the
/// complete reply, so calls must follow the server's menu flow.
pub struct GameClient {
    stream: TcpStream,
    server_addr: SocketAddr,
}

impl GameClient {
    /// Connects and waits until a worker picks the connection up.
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        let server_addr = stream.peer_addr()?;
        let mut client = Self {
            stream,
            server_addr,
        };
        info!("Connected to {}, waiting for a free worker", server_addr);
        client.wait_until_served()?;
        Ok(client)
    }

    /// Connects without waiting for the connected ack.
    pub fn connect_queued(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        let server_addr = stream.peer_addr()?;
        Ok(Self {
            stream,
            server_addr,
        })
    }

    /// Blocks until the server sends the connected ack.
    pub fn wait_until_served(&mut self) -> Result<(), ClientError> {
        let ack = self.read_int()?;
        if ack != CONNECTED {
            return Err(ClientError::Protocol(format!("expected connected ack, got {}", ack)));
        }
        debug!("Session started with {}", self.server_addr);
        Ok(())
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Returns whether the server accepted the credentials. On rejection the
    /// server closes the connection.
    pub fn login(&mut self, username: &str, password: &str) -> Result<bool, ClientError> {
        self.send(&AuthRequest::new(username, password))?;
        let accepted = self.read_int()? == AUTH_SUCCESS;
        info!("Login as {}: {}", username, if accepted { "accepted" } else { "rejected" });
        Ok(accepted)
    }

    /// Sends a raw menu code, including ones the server does not know.
    pub fn select_code(&mut self, code: i32) -> Result<(), ClientError> {
        self.send(&code)
    }

    pub fn select(&mut self, selection: MenuSelection) -> Result<(), ClientError> {
        self.select_code(selection.code())
    }

    /// Starts a game and returns the fresh board.
    pub fn start_game(&mut self) -> Result<BoardSnapshot, ClientError> {
        self.select(MenuSelection::Play)?;
        self.read_board()
    }

    pub fn make_move(
        &mut self,
        action: Action,
        row: u8,
        column: i32,
    ) -> Result<MoveOutcome, ClientError> {
        self.send_action(action.byte(), row, column)?;
        self.read_outcome()
    }

    /// Sends any action byte followed by coordinates.
    pub fn send_action(&mut self, byte: u8, row: u8, column: i32) -> Result<(), ClientError> {
        self.write(&[byte])?;
        self.send(&Coordinates { row, column })
    }

    pub fn read_outcome(&mut self) -> Result<MoveOutcome, ClientError> {
        let code = self.read_int()?;
        let result = MoveResult::from_code(code)
            .ok_or_else(|| ClientError::Protocol(format!("unknown result code {}", code)))?;
        let board = self.read_board()?;
        let duration = if result == MoveResult::GameWon {
            Some(decode_long(&self.read_bytes(LONG_SIZE)?)?)
        } else {
            None
        };
        Ok(MoveOutcome {
            result,
            board,
            duration,
        })
    }

    /// Abandons the current game and returns to the menu.
    pub fn quit_game(&mut self) -> Result<(), ClientError> {
        self.write(&[Action::Quit.byte()])
    }

    /// Fetches the leaderboard; an empty list means nobody has won yet.
    pub fn leaderboard(&mut self) -> Result<Vec<LeaderboardRow>, ClientError> {
        self.select(MenuSelection::Leaderboard)?;
        let mut rows = Vec::new();
        if self.read_int()? == LEADERBOARD_EMPTY {
            return Ok(rows);
        }
        loop {
            rows.push(decode(&self.read_bytes(LEADERBOARD_ROW_SIZE)?)?);
            if self.read_int()? != ENTRIES_MORE {
                return Ok(rows);
            }
        }
    }

    /// Leaves the menu and waits for the server to close the socket.
    pub fn quit(mut self) -> Result<(), ClientError> {
        self.select(MenuSelection::Quit)?;
        self.wait_for_close()
    }

    /// Reads until end of stream, failing if the server sends anything.
    pub fn wait_for_close(&mut self) -> Result<(), ClientError> {
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest)?;
        let _ = self.stream.shutdown(Shutdown::Both);
        if rest.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Protocol(format!("{} unexpected bytes before close", rest.len())))
        }
    }

    pub fn read_board(&mut self) -> Result<BoardSnapshot, ClientError> {
        Ok(BoardSnapshot::decode(&self.read_bytes(SNAPSHOT_SIZE)?)?)
    }

    pub fn read_int(&mut self) -> Result<i32, ClientError> {
        Ok(decode_int(&self.read_bytes(INT_SIZE)?)?)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ClientError> {
        let mut buf = vec![0u8; len];
        match self.stream.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(ClientError::Disconnected),
            Err(e) => Err(e.into()),
        }
    }

    fn send<T: serde::Serialize>(&mut self, value: &T) -> Result<(), ClientError> {
        let data = serialize(value).map_err(WireError::from)?;
        self.write(&data)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes)?;
        Ok(())
    }
}
