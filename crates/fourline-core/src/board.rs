//! Game board representation and win detection.
//!
//! This module contains:
//! - The two teams and the cell values they place
//! - The column-major board grid with bounded column height
//! - The contiguous-run win scan around a just-placed piece
//! - The `FieldState` snapshot pushed to observers

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Smallest accepted board dimension (columns or height)
pub const MIN_DIMENSION: usize = 4;

/// Largest accepted board dimension (columns or height)
pub const MAX_DIMENSION: usize = 20;

/// Contiguous run length that wins the game
pub const WIN_LENGTH: usize = 4;

/// The two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "o")]
    O,
}

impl Team {
    /// The team that moves after this one
    pub fn opponent(&self) -> Team {
        match self {
            Team::X => Team::O,
            Team::O => Team::X,
        }
    }
}

/// A placed piece.
///
/// Uppercase variants mark cells that belong to a completed winning run;
/// they still count as their team's pieces when scanning for further runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "o")]
    O,
    #[serde(rename = "X")]
    WinX,
    #[serde(rename = "O")]
    WinO,
}

impl Cell {
    /// The team that owns this piece, win-marked or not
    pub fn team(&self) -> Team {
        match self {
            Cell::X | Cell::WinX => Team::X,
            Cell::O | Cell::WinO => Team::O,
        }
    }

    /// Whether this piece is part of a completed winning run
    pub fn is_winning(&self) -> bool {
        matches!(self, Cell::WinX | Cell::WinO)
    }

    fn into_winning(self) -> Cell {
        match self {
            Cell::X | Cell::WinX => Cell::WinX,
            Cell::O | Cell::WinO => Cell::WinO,
        }
    }
}

impl From<Team> for Cell {
    fn from(team: Team) -> Self {
        match team {
            Team::X => Cell::X,
            Team::O => Cell::O,
        }
    }
}

/// Errors from board operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("board dimensions out of range")]
    InvalidDimension,

    #[error("column out of bounds")]
    ColumnOutOfBounds,

    #[error("column is full")]
    ColumnFull,
}

/// Read-only board snapshot pushed to observers.
///
/// `data` is column-major: `data[c][r]` is the piece in column `c` at row
/// `r`, counted from the bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub height: usize,
    pub data: Vec<Vec<Cell>>,
}

/// The game board.
///
/// Columns only ever grow by appending, up to `height` pieces each. The
/// zero-column, zero-height board is the reset form before any game has
/// been sized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    height: usize,
    columns: Vec<Vec<Cell>>,
}

/// The four scan axes: vertical, both diagonals, horizontal
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 1), (1, 0), (1, -1)];

impl Board {
    /// Create an unsized board (no columns, zero height)
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Maximum pieces per column
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pieces in a column, if it exists
    pub fn column_len(&self, column: usize) -> Option<usize> {
        self.columns.get(column).map(Vec::len)
    }

    /// Whether every column holds `height` pieces
    pub fn is_full(&self) -> bool {
        self.columns.iter().all(|col| col.len() >= self.height)
    }

    /// Replace the board with `columns` empty columns of capacity `height`.
    ///
    /// Both dimensions must lie in `[MIN_DIMENSION, MAX_DIMENSION]`; a
    /// rejected call leaves the board untouched.
    pub fn reset(&mut self, columns: usize, height: usize) -> Result<(), BoardError> {
        let valid = MIN_DIMENSION..=MAX_DIMENSION;
        if !valid.contains(&columns) || !valid.contains(&height) {
            return Err(BoardError::InvalidDimension);
        }

        self.height = height;
        self.columns = vec![Vec::new(); columns];
        Ok(())
    }

    /// Empty the board back to zero columns and zero height
    pub fn clear(&mut self) {
        self.height = 0;
        self.columns.clear();
    }

    /// Append a piece to a column, returning the row it landed in
    /// (0-based from the bottom).
    pub fn drop_piece(&mut self, column: usize, team: Team) -> Result<usize, BoardError> {
        let col = self
            .columns
            .get_mut(column)
            .ok_or(BoardError::ColumnOutOfBounds)?;
        if col.len() >= self.height {
            return Err(BoardError::ColumnFull);
        }

        col.push(team.into());
        Ok(col.len() - 1)
    }

    fn team_at(&self, column: isize, row: isize) -> Option<Team> {
        if column < 0 || row < 0 {
            return None;
        }
        self.columns
            .get(column as usize)?
            .get(row as usize)
            .map(Cell::team)
    }

    /// Scan for winning runs through the cell at `(column, row)`.
    ///
    /// For each axis direction the scan walks outward from the placed cell
    /// in both directions, collecting contiguous cells of the same team.
    /// Matching goes by team, so already win-marked cells extend a run and
    /// overlapping wins merge. Every run of length >= [`WIN_LENGTH`] has
    /// its cells unioned into the result; `None` if no axis reaches it.
    pub fn winning_cells(
        &self,
        column: usize,
        row: usize,
        team: Team,
    ) -> Option<BTreeSet<(usize, usize)>> {
        let mut matched = BTreeSet::new();

        for (dc, dr) in DIRECTIONS {
            let mut run = Vec::new();

            let (mut c, mut r) = (column as isize, row as isize);
            while self.team_at(c, r) == Some(team) {
                run.push((c as usize, r as usize));
                c += dc;
                r += dr;
            }

            let (mut c, mut r) = (column as isize - dc, row as isize - dr);
            while self.team_at(c, r) == Some(team) {
                run.push((c as usize, r as usize));
                c -= dc;
                r -= dr;
            }

            if run.len() >= WIN_LENGTH {
                matched.extend(run);
            }
        }

        if matched.is_empty() {
            None
        } else {
            Some(matched)
        }
    }

    /// Rewrite the given cells to their win-marked form.
    ///
    /// Out-of-range coordinates are ignored; callers pass sets produced by
    /// [`Board::winning_cells`].
    pub fn mark_win(&mut self, cells: &BTreeSet<(usize, usize)>) {
        for &(column, row) in cells {
            if let Some(cell) = self
                .columns
                .get_mut(column)
                .and_then(|col| col.get_mut(row))
            {
                *cell = cell.into_winning();
            }
        }
    }

    /// A full copy of the grid for publishing
    pub fn snapshot(&self) -> FieldState {
        FieldState {
            height: self.height,
            data: self.columns.clone(),
        }
    }
}
