//! Authoritative game controller and state machine.
//!
//! One [`Game`] instance owns a room's roster and board for the room's
//! whole lifetime. Observers never write state directly: every mutation
//! goes through [`Game::apply`], which validates fully before touching
//! anything, then returns the snapshot events to publish.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, FieldState, Team};
use crate::roster::{PlayerId, Roster, RosterError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned from game actions.
///
/// Every failure is synchronous and caller-visible; a rejected action
/// leaves the room state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    /// Caller holds no player or team binding required for the action
    #[error("not a player")]
    NotAPlayer,

    /// Not the caller's turn, or the game is already decided
    #[error("wrong team")]
    WrongTeam,

    #[error("team is taken")]
    TeamTaken,

    /// A turn is already active
    #[error("wrong state")]
    WrongState,

    /// One or both team slots are unfilled
    #[error("no players")]
    NoPlayers,

    #[error("board dimensions out of range")]
    InvalidDimension,

    #[error("column out of bounds")]
    ColumnOutOfBounds,

    #[error("column is full")]
    ColumnFull,
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Action invalid for the current state
    StateConflict,
    /// Caller lacks the player/team binding the action requires
    NotAuthorized,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotAPlayer => ErrorKind::NotAuthorized,
            GameError::WrongTeam
            | GameError::TeamTaken
            | GameError::WrongState
            | GameError::NoPlayers => ErrorKind::StateConflict,
            GameError::InvalidDimension
            | GameError::ColumnOutOfBounds
            | GameError::ColumnFull => ErrorKind::Validation,
        }
    }
}

impl From<crate::board::BoardError> for GameError {
    fn from(err: crate::board::BoardError) -> Self {
        match err {
            crate::board::BoardError::InvalidDimension => GameError::InvalidDimension,
            crate::board::BoardError::ColumnOutOfBounds => GameError::ColumnOutOfBounds,
            crate::board::BoardError::ColumnFull => GameError::ColumnFull,
        }
    }
}

/// The externally published game snapshot, read-only to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Winning team, once decided
    pub win: Option<Team>,
    /// Display name of the player on team x
    pub x: Option<String>,
    /// Display name of the player on team o
    pub o: Option<String>,
    /// Whose move is next; `None` means no turn is forced
    pub turn: Option<Team>,
}

/// Conceptual phase, derived from the state fields rather than stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No board sized
    Idle,
    /// Board sized but one or both teams empty
    AwaitingPlayers,
    /// Both teams filled; a match is live
    InProgress,
    /// A win has been recorded
    Finished,
}

/// A room's authoritative game.
#[derive(Debug, Clone, Default)]
pub struct Game {
    roster: Roster,
    board: Board,
    win: Option<Team>,
    x: Option<String>,
    o: Option<String>,
    turn: Option<Team>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection as a player.
    ///
    /// A connection without a resolvable display name stays an observer:
    /// it receives snapshots but cannot act.
    pub fn register_player(
        &mut self,
        id: PlayerId,
        candidate_name: Option<&str>,
    ) -> Result<(), RosterError> {
        self.roster.register(id, candidate_name).map(|_| ())
    }

    /// Handle a dropped connection.
    ///
    /// The player is force-kicked from the roster. If it held a team the
    /// whole game resets — a departure invalidates the match rather than
    /// leaving the opponent stuck against an absent player. The reset is
    /// an ordinary transition, never an error.
    pub fn remove_player(&mut self, id: PlayerId) -> Vec<GameEvent> {
        let Some(player) = self.roster.remove(id) else {
            return Vec::new();
        };

        if player.team.is_some() {
            self.reset_game()
        } else {
            Vec::new()
        }
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    /// Apply a caller's action, returning the snapshots to publish.
    pub fn apply(
        &mut self,
        caller: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        match action {
            GameAction::JoinTeam { team } => self.join_team(caller, team),
            GameAction::Start { columns, height } => self.start(caller, columns, height),
            GameAction::Move { column } => self.make_move(caller, column),
        }
    }

    fn join_team(&mut self, caller: PlayerId, team: Team) -> Result<Vec<GameEvent>, GameError> {
        if self.roster.get(caller).is_none() {
            return Err(GameError::NotAPlayer);
        }
        // The occupancy check does not special-case the caller: rejoining
        // one's own slot also fails.
        if self.roster.team_holder(team).is_some() {
            return Err(GameError::TeamTaken);
        }

        self.roster
            .set_team(caller, Some(team))
            .map_err(|_| GameError::TeamTaken)?;

        // Any re-seating clears stale win/turn markers, even mid-match.
        // The board contents are left alone until the next start.
        self.x = self.roster.team_holder(Team::X).map(|p| p.name.clone());
        self.o = self.roster.team_holder(Team::O).map(|p| p.name.clone());
        self.win = None;
        self.turn = None;

        Ok(vec![GameEvent::StateChanged {
            state: self.snapshot(),
        }])
    }

    fn start(
        &mut self,
        caller: PlayerId,
        columns: Option<usize>,
        height: Option<usize>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.team_of(caller)?;
        if self.turn.is_some() {
            return Err(GameError::WrongState);
        }
        if self.x.is_none() || self.o.is_none() {
            return Err(GameError::NoPlayers);
        }

        let columns = columns.unwrap_or_else(|| self.board.column_count());
        let height = height.unwrap_or_else(|| self.board.height());
        self.board.reset(columns, height)?;
        self.win = None;

        // Deliberately no initial turn: the first move by either team is
        // accepted and fixes the rotation from there.
        Ok(vec![
            GameEvent::FieldChanged {
                field: self.board.snapshot(),
            },
            GameEvent::StateChanged {
                state: self.snapshot(),
            },
        ])
    }

    fn make_move(&mut self, caller: PlayerId, column: usize) -> Result<Vec<GameEvent>, GameError> {
        let team = self.team_of(caller)?;
        if self.turn.is_some_and(|turn| turn != team) {
            return Err(GameError::WrongTeam);
        }
        if self.win.is_some() {
            return Err(GameError::WrongTeam);
        }

        // drop_piece validates column and capacity before appending, so a
        // rejected move has touched nothing.
        let row = self.board.drop_piece(column, team)?;

        if let Some(cells) = self.board.winning_cells(column, row, team) {
            self.board.mark_win(&cells);
            self.win = Some(team);
            self.turn = None;
        } else if self.board.is_full() {
            // Draw: nobody wins and no turn is forced
            self.turn = None;
        } else {
            self.turn = Some(team.opponent());
        }

        Ok(vec![
            GameEvent::FieldChanged {
                field: self.board.snapshot(),
            },
            GameEvent::StateChanged {
                state: self.snapshot(),
            },
        ])
    }

    fn reset_game(&mut self) -> Vec<GameEvent> {
        self.roster.clear_teams();
        self.x = None;
        self.o = None;
        self.turn = None;
        self.win = None;
        self.board.clear();

        vec![
            GameEvent::FieldChanged {
                field: self.board.snapshot(),
            },
            GameEvent::StateChanged {
                state: self.snapshot(),
            },
        ]
    }

    /// The caller's team, or `NotAPlayer` when it has no binding to act with
    fn team_of(&self, caller: PlayerId) -> Result<Team, GameError> {
        self.roster
            .get(caller)
            .and_then(|player| player.team)
            .ok_or(GameError::NotAPlayer)
    }

    /// Current authoritative snapshot
    pub fn snapshot(&self) -> GameState {
        GameState {
            win: self.win,
            x: self.x.clone(),
            o: self.o.clone(),
            turn: self.turn,
        }
    }

    /// Current board snapshot
    pub fn field(&self) -> FieldState {
        self.board.snapshot()
    }

    pub fn phase(&self) -> GamePhase {
        if self.win.is_some() {
            GamePhase::Finished
        } else if self.board.column_count() == 0 {
            GamePhase::Idle
        } else if self.x.is_none() || self.o.is_none() {
            GamePhase::AwaitingPlayers
        } else {
            GamePhase::InProgress
        }
    }
}
