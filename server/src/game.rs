//! Minesweeper board and the engines that deal fresh ones.
//!
//! The win rule is flag based: a game is won the moment every mine carries a
//! flag, whether or not the safe tiles have been uncovered.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    Action, BoardSnapshot, Coordinates, MoveResult, TileRecord, BOARD_COLUMNS, BOARD_ROWS,
    MINE_COUNT, TILE_COUNT,
};
use std::sync::Mutex;

/// Deals boards to sessions. Shared by every worker.
pub trait GameEngine: Send + Sync {
    fn new_board(&self) -> Board;
}

/// Mines placed uniformly at random over distinct cells.
#[derive(Debug)]
pub struct RandomBoards {
    rng: Mutex<StdRng>,
}

impl RandomBoards {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl GameEngine for RandomBoards {
    fn new_board(&self) -> Board {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        Board::random(&mut *rng)
    }
}

/// Hands out the same layout every time.
#[derive(Debug, Clone)]
pub struct FixedLayout {
    mines: Vec<(usize, usize)>,
}

impl FixedLayout {
    pub fn new(mines: impl Into<Vec<(usize, usize)>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }
}

impl GameEngine for FixedLayout {
    fn new_board(&self) -> Board {
        Board::with_mines(&self.mines)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub adjacent_mines: i32,
    pub revealed: bool,
    pub is_mine: bool,
    pub flagged: bool,
}

impl Tile {
    fn to_record(self) -> TileRecord {
        if self.revealed {
            TileRecord {
                adjacent_mines: self.adjacent_mines,
                revealed: true,
                is_mine: self.is_mine,
                flagged: self.flagged,
                padding: 0,
            }
        } else {
            TileRecord::masked(self.flagged)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    tiles: [[Tile; BOARD_COLUMNS]; BOARD_ROWS],
    mines_remaining: i32,
}

fn neighbours(row: usize, column: usize) -> impl Iterator<Item = (usize, usize)> {
    (-1i32..=1)
        .flat_map(|dr| (-1i32..=1).map(move |dc| (dr, dc)))
        .filter(|&offset| offset != (0, 0))
        .filter_map(move |(dr, dc)| {
            let r = row as i32 + dr;
            let c = column as i32 + dc;
            let in_bounds = (0..BOARD_ROWS as i32).contains(&r) && (0..BOARD_COLUMNS as i32).contains(&c);
            in_bounds.then_some((r as usize, c as usize))
        })
}

impl Board {
    fn empty() -> Self {
        Self {
            tiles: [[Tile::default(); BOARD_COLUMNS]; BOARD_ROWS],
            mines_remaining: 0,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let cells = rand::seq::index::sample(rng, TILE_COUNT, MINE_COUNT);
        let mines: Vec<(usize, usize)> = cells
            .into_iter()
            .map(|cell| (cell / BOARD_COLUMNS, cell % BOARD_COLUMNS))
            .collect();
        debug!("Dealt board with mines at {:?}", mines);
        Self::with_mines(&mines)
    }

    /// Builds a board from explicit mine positions. Out-of-range and repeated
    /// positions are skipped.
    pub fn with_mines(mines: &[(usize, usize)]) -> Self {
        let mut board = Self::empty();
        for &(row, column) in mines {
            if row >= BOARD_ROWS || column >= BOARD_COLUMNS || board.tiles[row][column].is_mine {
                continue;
            }
            board.tiles[row][column].is_mine = true;
            board.mines_remaining += 1;
            for (r, c) in neighbours(row, column) {
                board.tiles[r][c].adjacent_mines += 1;
            }
        }
        board
    }

    pub fn tile(&self, row: usize, column: usize) -> Tile {
        self.tiles[row][column]
    }

    pub fn mines_remaining(&self) -> i32 {
        self.mines_remaining
    }

    pub fn mine_positions(&self) -> Vec<(usize, usize)> {
        self.cells().filter(|&(r, c)| self.tiles[r][c].is_mine).collect()
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        (0..BOARD_ROWS).flat_map(|r| (0..BOARD_COLUMNS).map(move |c| (r, c)))
    }

    /// Applies a reveal or flag at the client's coordinates.
    pub fn apply(&mut self, action: Action, at: Coordinates) -> MoveResult {
        let Some((row, column)) = at.to_indices() else {
            return MoveResult::InvalidCoordinates;
        };
        match action {
            Action::Reveal => self.reveal(row, column),
            Action::Flag => self.toggle_flag(row, column),
            Action::Quit => MoveResult::Normal,
        }
    }

    pub fn reveal(&mut self, row: usize, column: usize) -> MoveResult {
        if row >= BOARD_ROWS || column >= BOARD_COLUMNS {
            return MoveResult::InvalidCoordinates;
        }
        let tile = self.tiles[row][column];
        if tile.revealed {
            return MoveResult::TileAlreadyRevealed;
        }
        if tile.is_mine {
            self.reveal_all();
            return MoveResult::GameLost;
        }
        self.flood_reveal(row, column);
        MoveResult::Normal
    }

    /// Uncovers the tile and, through zero-count tiles, everything connected
    /// to it. A tile is marked before its neighbours are pushed, so each one
    /// is expanded at most once.
    fn flood_reveal(&mut self, row: usize, column: usize) {
        let mut stack = vec![(row, column)];
        self.tiles[row][column].revealed = true;

        while let Some((r, c)) = stack.pop() {
            if self.tiles[r][c].adjacent_mines != 0 {
                continue;
            }
            for (nr, nc) in neighbours(r, c) {
                let next = &mut self.tiles[nr][nc];
                if !next.revealed && !next.is_mine {
                    next.revealed = true;
                    stack.push((nr, nc));
                }
            }
        }
    }

    /// Flags or unflags a mine. Non-mine tiles are refused.
    pub fn toggle_flag(&mut self, row: usize, column: usize) -> MoveResult {
        if row >= BOARD_ROWS || column >= BOARD_COLUMNS {
            return MoveResult::InvalidCoordinates;
        }
        let tile = &mut self.tiles[row][column];
        if !tile.is_mine {
            return MoveResult::NoMineAtFlag;
        }

        tile.flagged = !tile.flagged;
        if tile.flagged {
            self.mines_remaining -= 1;
        } else {
            self.mines_remaining += 1;
        }

        if self.mines_remaining == 0 {
            MoveResult::GameWon
        } else {
            MoveResult::Normal
        }
    }

    pub fn reveal_all(&mut self) {
        for row in self.tiles.iter_mut() {
            for tile in row.iter_mut() {
                tile.revealed = true;
            }
        }
    }

    /// What the client may see: unrevealed tiles disclose only their flag.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            tiles: self
                .tiles
                .iter()
                .flat_map(|row| row.iter().map(|tile| tile.to_record()))
                .collect(),
            mines_remaining: self.mines_remaining,
        }
    }
}
