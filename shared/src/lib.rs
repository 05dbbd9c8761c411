//! Wire protocol shared by the minesweeper server and its clients.
//!
//! Every message is a fixed-width record; neither side sends length prefixes,
//! each knows how many bytes to read next from its position in the protocol.
//! Records are encoded with `bincode`'s default (fixint, little-endian)
//! configuration, so a `#[derive(Serialize)]` struct lays out exactly like its
//! fields back to back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOARD_ROWS: usize = 9;
pub const BOARD_COLUMNS: usize = 9;
pub const TILE_COUNT: usize = BOARD_ROWS * BOARD_COLUMNS;
pub const MINE_COUNT: usize = 10;

/// Width of the username and password fields, NUL padded.
pub const FIELD_LENGTH: usize = 20;
pub const DEFAULT_PORT: u16 = 12345;

pub const INT_SIZE: usize = 4;
pub const LONG_SIZE: usize = 8;
pub const AUTH_REQUEST_SIZE: usize = FIELD_LENGTH * 2;
pub const COORDINATES_SIZE: usize = 1 + INT_SIZE;
pub const TILE_RECORD_SIZE: usize = INT_SIZE + 4;
pub const SNAPSHOT_SIZE: usize = TILE_COUNT * TILE_RECORD_SIZE + INT_SIZE;
pub const LEADERBOARD_ROW_SIZE: usize = FIELD_LENGTH + LONG_SIZE + INT_SIZE * 2;

/// Sent once a worker picks up a queued connection.
pub const CONNECTED: i32 = 1;
pub const AUTH_FAILURE: i32 = 0;
pub const AUTH_SUCCESS: i32 = 1;
pub const LEADERBOARD_EMPTY: i32 = 0;
pub const LEADERBOARD_PRESENT: i32 = 1;
pub const ENTRIES_END: i32 = 0;
pub const ENTRIES_MORE: i32 = 1;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Outcome of applying one move to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    Normal,
    NoMineAtFlag,
    TileAlreadyRevealed,
    InvalidCoordinates,
    GameWon,
    GameLost,
}

impl MoveResult {
    pub fn code(self) -> i32 {
        match self {
            MoveResult::Normal => 0,
            MoveResult::NoMineAtFlag => 1,
            MoveResult::TileAlreadyRevealed => 2,
            MoveResult::InvalidCoordinates => 3,
            MoveResult::GameWon => 4,
            MoveResult::GameLost => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MoveResult::Normal),
            1 => Some(MoveResult::NoMineAtFlag),
            2 => Some(MoveResult::TileAlreadyRevealed),
            3 => Some(MoveResult::InvalidCoordinates),
            4 => Some(MoveResult::GameWon),
            5 => Some(MoveResult::GameLost),
            _ => None,
        }
    }

    /// True for the two results that end a game.
    pub fn ends_game(self) -> bool {
        matches!(self, MoveResult::GameWon | MoveResult::GameLost)
    }
}

/// Main menu choice sent as an int32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSelection {
    Play,
    Leaderboard,
    Quit,
}

impl MenuSelection {
    pub fn code(self) -> i32 {
        match self {
            MenuSelection::Play => 1,
            MenuSelection::Leaderboard => 2,
            MenuSelection::Quit => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(MenuSelection::Play),
            2 => Some(MenuSelection::Leaderboard),
            3 => Some(MenuSelection::Quit),
            _ => None,
        }
    }
}

/// In-game action sent as a single ASCII byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Reveal,
    Flag,
    Quit,
}

impl Action {
    pub fn byte(self) -> u8 {
        match self {
            Action::Reveal => b'R',
            Action::Flag => b'P',
            Action::Quit => b'Q',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'R' => Some(Action::Reveal),
            b'P' => Some(Action::Flag),
            b'Q' => Some(Action::Quit),
            _ => None,
        }
    }
}

pub type Field = [u8; FIELD_LENGTH];

/// Packs a string into a fixed-width field, truncating anything longer.
pub fn encode_field(value: &str) -> Field {
    let mut field = [0u8; FIELD_LENGTH];
    let bytes = value.as_bytes();
    let len = bytes.len().min(FIELD_LENGTH);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Reads a field up to its first NUL byte.
pub fn decode_field(field: &Field) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(FIELD_LENGTH);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequest {
    pub username: Field,
    pub password: Field,
}

impl AuthRequest {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: encode_field(username),
            password: encode_field(password),
        }
    }
}

/// Row letter and one-based column following an `R` or `P` action.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Coordinates {
    pub row: u8,
    pub column: i32,
}

impl Coordinates {
    /// Zero-based indices, or `None` when either lies outside the board.
    pub fn to_indices(self) -> Option<(usize, usize)> {
        let row = i32::from(self.row) - i32::from(b'A');
        let column = self.column.checked_sub(1)?;
        if (0..BOARD_ROWS as i32).contains(&row) && (0..BOARD_COLUMNS as i32).contains(&column) {
            Some((row as usize, column as usize))
        } else {
            None
        }
    }
}

/// One tile as seen by the client. The trailing byte keeps the record at the
/// eight bytes a C `Tile` struct occupies.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileRecord {
    pub adjacent_mines: i32,
    pub revealed: bool,
    pub is_mine: bool,
    pub flagged: bool,
    pub padding: u8,
}

impl TileRecord {
    /// Record for an unrevealed tile: only the flag state is disclosed.
    pub fn masked(flagged: bool) -> Self {
        Self {
            flagged,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub tiles: Vec<TileRecord>,
    pub mines_remaining: i32,
}

impl BoardSnapshot {
    pub fn tile(&self, row: usize, column: usize) -> &TileRecord {
        &self.tiles[row * BOARD_COLUMNS + column]
    }

    pub fn revealed_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.revealed).count()
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.tiles.len() != TILE_COUNT {
            return Err(WireError::Length {
                expected: TILE_COUNT,
                actual: self.tiles.len(),
            });
        }
        let mut buf = Vec::with_capacity(SNAPSHOT_SIZE);
        for tile in &self.tiles {
            bincode::serialize_into(&mut buf, tile)?;
        }
        bincode::serialize_into(&mut buf, &self.mines_remaining)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        check_len(bytes, SNAPSHOT_SIZE)?;
        let (tile_bytes, tail) = bytes.split_at(TILE_COUNT * TILE_RECORD_SIZE);
        let tiles = tile_bytes
            .chunks_exact(TILE_RECORD_SIZE)
            .map(|chunk| bincode::deserialize::<TileRecord>(chunk))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tiles,
            mines_remaining: bincode::deserialize(tail)?,
        })
    }
}

/// One leaderboard line; the "more entries follow" flag is sent separately.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub username: Field,
    pub duration: i64,
    pub games_won: i32,
    pub games_played: i32,
}

impl LeaderboardRow {
    pub fn username(&self) -> String {
        decode_field(&self.username)
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_int(bytes: &[u8]) -> Result<i32, WireError> {
    check_len(bytes, INT_SIZE)?;
    decode(bytes)
}

pub fn decode_long(bytes: &[u8]) -> Result<i64, WireError> {
    check_len(bytes, LONG_SIZE)?;
    decode(bytes)
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), WireError> {
    if bytes.len() != expected {
        return Err(WireError::Length {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes_match_protocol() {
        assert_eq!(encode(&AuthRequest::new("alice", "secret")).unwrap().len(), AUTH_REQUEST_SIZE);
        assert_eq!(
            encode(&Coordinates { row: b'E', column: 5 }).unwrap().len(),
            COORDINATES_SIZE
        );
        assert_eq!(encode(&TileRecord::default()).unwrap().len(), TILE_RECORD_SIZE);
        let row = LeaderboardRow {
            username: encode_field("bob"),
            duration: 12,
            games_won: 1,
            games_played: 3,
        };
        assert_eq!(encode(&row).unwrap().len(), LEADERBOARD_ROW_SIZE);
    }

    #[test]
    fn test_integers_are_little_endian() {
        assert_eq!(encode(&5i32).unwrap(), vec![5, 0, 0, 0]);
        assert_eq!(encode(&258i64).unwrap(), vec![2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_tile_record_layout() {
        let tile = TileRecord {
            adjacent_mines: 3,
            revealed: true,
            is_mine: false,
            flagged: true,
            padding: 0,
        };
        assert_eq!(encode(&tile).unwrap(), vec![3, 0, 0, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_field_truncates_and_pads() {
        let field = encode_field("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(decode_field(&field), "abcdefghijklmnopqrst");

        let field = encode_field("bob");
        assert_eq!(&field[..4], b"bob\0");
        assert_eq!(decode_field(&field), "bob");
    }

    #[test]
    fn test_coordinates_to_indices() {
        assert_eq!(Coordinates { row: b'A', column: 1 }.to_indices(), Some((0, 0)));
        assert_eq!(Coordinates { row: b'E', column: 5 }.to_indices(), Some((4, 4)));
        assert_eq!(Coordinates { row: b'I', column: 9 }.to_indices(), Some((8, 8)));
        assert_eq!(Coordinates { row: b'J', column: 1 }.to_indices(), None);
        assert_eq!(Coordinates { row: b'A', column: 0 }.to_indices(), None);
        assert_eq!(Coordinates { row: b'A', column: 10 }.to_indices(), None);
        assert_eq!(Coordinates { row: b'a', column: 1 }.to_indices(), None);
        assert_eq!(Coordinates { row: b'A', column: i32::MIN }.to_indices(), None);
    }

    #[test]
    fn test_snapshot_decode_rejects_short_buffer() {
        let err = BoardSnapshot::decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, WireError::Length { expected: SNAPSHOT_SIZE, actual: 10 }));
    }

    #[test]
    fn test_snapshot_encoding() {
        let mut tiles = vec![TileRecord::masked(false); TILE_COUNT];
        tiles[80] = TileRecord::masked(true);
        let snapshot = BoardSnapshot {
            tiles,
            mines_remaining: 9,
        };

        let bytes = snapshot.encode().unwrap();
        assert_eq!(bytes.len(), SNAPSHOT_SIZE);
        assert_eq!(&bytes[SNAPSHOT_SIZE - 4..], &[9, 0, 0, 0]);
        assert_eq!(BoardSnapshot::decode(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_result_codes() {
        for code in 0..6 {
            assert_eq!(MoveResult::from_code(code).unwrap().code(), code);
        }
        assert_eq!(MoveResult::from_code(6), None);
        assert!(MoveResult::GameWon.ends_game());
        assert!(MoveResult::GameLost.ends_game());
        assert!(!MoveResult::NoMineAtFlag.ends_game());
    }

    #[test]
    fn test_menu_and_action_codes() {
        assert_eq!(MenuSelection::from_code(1), Some(MenuSelection::Play));
        assert_eq!(MenuSelection::from_code(3), Some(MenuSelection::Quit));
        assert_eq!(MenuSelection::from_code(7), None);
        assert_eq!(Action::from_byte(b'P'), Some(Action::Flag));
        assert_eq!(Action::from_byte(b'x'), None);
        assert_eq!(Action::Quit.byte(), b'Q');
    }
}
