//! Actions callers can invoke and the snapshot events they produce.
//!
//! Mutation only happens through the closed [`GameAction`] set, dispatched
//! through [`Game::apply`](crate::game::Game::apply). Every successful
//! action yields [`GameEvent`]s carrying complete snapshots for the
//! publisher to fan out — there is no partial or delta publish.

use crate::board::{FieldState, Team};
use crate::game::GameState;
use serde::{Deserialize, Serialize};

/// All actions a caller can take against a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Claim a team slot
    JoinTeam { team: Team },

    /// Size the board and open a new round.
    ///
    /// Omitted dimensions default to the board's current ones.
    Start {
        columns: Option<usize>,
        height: Option<usize>,
    },

    /// Drop the caller's piece into a column
    Move { column: usize },
}

/// Snapshot events produced by a successful action.
///
/// Consumers always receive a complete, self-consistent copy of the state
/// that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The board grid changed
    FieldChanged { field: FieldState },

    /// The authoritative game state changed
    StateChanged { state: GameState },
}
