//! Parsing of typed moves such as `R A1` or `P e5`.

use shared::Action;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommand {
    pub action: Action,
    pub row: u8,
    pub column: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid move {0:?}: expected R or P then a tile like A1")]
pub struct ParseMoveError(String);

impl FromStr for MoveCommand {
    type Err = ParseMoveError;

    /// Accepts an action letter and a tile, with or without a space between
    /// them. The row letter is upper-cased; range checks are left to the
    /// server.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoveError(s.to_string());
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let mut chars = compact.chars();

        let action = chars
            .next()
            .and_then(|c| u8::try_from(c.to_ascii_uppercase()).ok())
            .and_then(Action::from_byte)
            .filter(|a| *a != Action::Quit)
            .ok_or_else(err)?;
        let row = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase() as u8)
            .ok_or_else(err)?;
        let column = chars.as_str().parse::<i32>().map_err(|_| err())?;

        Ok(Self {
            action,
            row,
            column,
        })
    }
}
