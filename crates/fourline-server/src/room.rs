//! Game room management.
//!
//! A room owns one authoritative [`Game`] and the set of connections
//! subscribed to its snapshots. Named connections are registered as
//! players; unnamed ones stay observers and only watch.

use fourline_core::{FieldState, Game, GameAction, GameError, GameEvent, GameState};
use std::collections::HashSet;
use uuid::Uuid;

/// One isolated game session.
pub struct GameRoom {
    pub id: Uuid,
    game: Game,
    /// Every connection in the room, player or observer
    connections: HashSet<Uuid>,
}

impl GameRoom {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            game: Game::new(),
            connections: HashSet::new(),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections subscribed to this room's snapshot stream
    pub fn connections(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.connections.iter().copied()
    }

    /// Admit a connection; returns whether it was registered as a player.
    ///
    /// Registration only fails on an unusable name, which downgrades the
    /// connection to an observer rather than turning it away.
    pub fn join(&mut self, connection: Uuid, player_name: Option<&str>) -> bool {
        self.connections.insert(connection);
        self.game.register_player(connection, player_name).is_ok()
    }

    /// Remove a connection, returning the snapshots its departure forced
    /// (a departing team-holder resets the game) and whether the room is
    /// now empty.
    pub fn leave(&mut self, connection: Uuid) -> (Vec<GameEvent>, bool) {
        self.connections.remove(&connection);
        let events = self.game.remove_player(connection);
        (events, self.connections.is_empty())
    }

    /// Apply a game action for a connection.
    pub fn apply(
        &mut self,
        connection: Uuid,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.game.apply(connection, action)
    }

    /// Current snapshots, for fresh subscribers
    pub fn snapshots(&self) -> (GameState, FieldState) {
        (self.game.snapshot(), self.game.field())
    }
}
