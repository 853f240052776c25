//! Fourline - a shared-room connect-four game engine
//!
//! This crate provides the authoritative game logic for Fourline,
//! including:
//! - The variable-size, column-major board with win detection
//! - The roster of connected players and team-slot exclusivity
//! - The game controller validating and applying caller actions
//! - The full-snapshot publish contract observers rely on
//!
//! # Architecture
//!
//! One [`game::Game`] instance owns a room's state for the room's whole
//! lifetime; viewers and players mutate it only through
//! [`game::Game::apply`]. The engine is platform-agnostic: it performs no
//! I/O and leaves transport, fan-out, and encoding to the hosting server.
//!
//! # Modules
//!
//! - [`board`]: board grid, cells, and the win-check algorithm
//! - [`roster`]: connected players and team lifecycle
//! - [`actions`]: the closed action set and published snapshot events
//! - [`game`]: the controller state machine

pub mod actions;
pub mod board;
pub mod game;
pub mod roster;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{Board, BoardError, Cell, FieldState, Team, MAX_DIMENSION, MIN_DIMENSION, WIN_LENGTH};
pub use game::{ErrorKind, Game, GameError, GamePhase, GameState};
pub use roster::{Player, PlayerId, Roster, RosterError};
