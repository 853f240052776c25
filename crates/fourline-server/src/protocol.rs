//! WebSocket protocol messages for Fourline rooms.

use fourline_core::{FieldState, GameState, Team};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room.
    ///
    /// A missing or blank name joins the creator as a pure observer.
    CreateRoom { player_name: Option<String> },

    /// Join an existing room, as a player (named) or observer (unnamed)
    JoinRoom {
        room_id: Uuid,
        player_name: Option<String>,
    },

    /// Leave current room
    LeaveRoom,

    /// Claim a team slot
    JoinTeam { team: Team },

    /// Size the board and open a round; omitted dimensions keep current
    Start {
        columns: Option<usize>,
        height: Option<usize>,
    },

    /// Drop a piece into a column
    Move { column: usize },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully; `player` is false for observers
    JoinedRoom { room_id: Uuid, player: bool },

    /// Left room successfully
    LeftRoom,

    /// Authoritative game snapshot (win, names, turn)
    GameState { state: GameState },

    /// Board snapshot
    FieldState { field: FieldState },

    /// Result of a game action from this connection
    ActionResult {
        success: bool,
        error: Option<String>,
    },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
