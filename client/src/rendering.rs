//! Plain-text views of boards, results and the leaderboard.

use shared::{BoardSnapshot, LeaderboardRow, MoveResult, BOARD_COLUMNS, BOARD_ROWS};
use std::fmt::Write;

/// Grid with a column header, row letters, `*` for mines, `+` for flags and
/// the adjacency count for revealed tiles.
pub fn render_board(board: &BoardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Remaining mines: {}", board.mines_remaining);
    out.push_str("\n    ");
    for column in 1..=BOARD_COLUMNS {
        let _ = write!(out, "{} ", column);
    }
    out.push_str("\n----");
    out.push_str(&"--".repeat(BOARD_COLUMNS));

    for row in 0..BOARD_ROWS {
        let _ = write!(out, "\n{} | ", (b'A' + row as u8) as char);
        for column in 0..BOARD_COLUMNS {
            let tile = board.tile(row, column);
            if tile.revealed && tile.is_mine {
                out.push_str("* ");
            } else if tile.revealed {
                let _ = write!(out, "{} ", tile.adjacent_mines);
            } else if tile.flagged {
                out.push_str("+ ");
            } else {
                out.push_str("  ");
            }
        }
    }
    out.push('\n');
    out
}

pub fn describe_result(result: MoveResult, duration: Option<i64>) -> Option<String> {
    match result {
        MoveResult::Normal => None,
        MoveResult::GameLost => Some("You lost!".into()),
        MoveResult::GameWon => Some(format!(
            "Congratulations! You have located all the mines.\nYou won in {} seconds!",
            duration.unwrap_or_default()
        )),
        MoveResult::NoMineAtFlag => Some("There was no mine at flag!".into()),
        MoveResult::TileAlreadyRevealed => Some("The tile was already revealed!".into()),
        MoveResult::InvalidCoordinates => Some(
            "The coordinates entered are invalid. Ensure they are within the game bounds!".into(),
        ),
    }
}

pub fn render_leaderboard(rows: &[LeaderboardRow]) -> String {
    let border = "=".repeat(49);
    let mut out = format!("\n{}\n", border);
    if rows.is_empty() {
        out.push_str(
            "\nThere is no information currently stored in the leaderboard. Try again later.\n",
        );
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{} \t {} seconds \t {} games won, {} games played",
            row.username(),
            row.duration,
            row.games_won,
            row.games_played
        );
    }
    let _ = write!(out, "\n{}\n", border);
    out
}
