//! WebSocket server and connection handling.
//!
//! All mutating access to a room goes through `rooms.get_mut`, whose
//! per-entry lock is the room's mutual-exclusion scope: one action runs
//! validation, mutation, and snapshot derivation to completion before the
//! next is admitted, disconnects included. Snapshot fan-out goes through
//! per-connection unbounded channels so a slow subscriber never holds up
//! the mutating path.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::GameRoom;
use dashmap::DashMap;
use fourline_core::{GameAction, GameEvent};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from connection ID to its room ID
    pub conn_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from connection ID to its message sender
    pub conn_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            conn_rooms: DashMap::new(),
            conn_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, connection: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.conn_senders.get(&connection) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to every connection in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for connection in room.connections() {
                self.send_to(connection, msg.clone());
            }
        }
    }

    /// Fan a batch of snapshot events out to a room.
    pub fn publish_events(&self, room_id: Uuid, events: Vec<GameEvent>) {
        for event in events {
            let msg = match event {
                GameEvent::StateChanged { state } => ServerMessage::GameState { state },
                GameEvent::FieldChanged { field } => ServerMessage::FieldState { field },
            };
            self.broadcast_to_room(room_id, msg);
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Fourline server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a connection ID
    let connection = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.conn_senders.insert(connection, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome {
        player_id: connection,
    };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_message(connection, client_msg, &state);
                } else {
                    warn!("Invalid message from {}: {}", connection, text);
                    state.send_to(
                        connection,
                        ServerMessage::Error {
                            message: "malformed message".to_string(),
                        },
                    );
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection);
                break;
            }
            Ok(Message::Ping(data)) => {
                state.send_to(connection, ServerMessage::Pong);
                let _ = data; // Just consume it
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(connection, &state);
    state.conn_senders.remove(&connection);
    send_task.abort();

    info!("Connection closed for {}", connection);
    Ok(())
}

/// Handle a client message.
fn handle_message(connection: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom { player_name } => {
            let room_id = Uuid::new_v4();
            let mut room = GameRoom::new(room_id);
            let as_player = room.join(connection, player_name.as_deref());
            let snapshots = room.snapshots();

            state.rooms.insert(room_id, room);
            state.conn_rooms.insert(connection, room_id);

            state.send_to(connection, ServerMessage::RoomCreated { room_id });
            state.send_to(
                connection,
                ServerMessage::JoinedRoom {
                    room_id,
                    player: as_player,
                },
            );
            // A fresh subscriber always receives the current snapshots
            state.send_to(
                connection,
                ServerMessage::GameState { state: snapshots.0 },
            );
            state.send_to(
                connection,
                ServerMessage::FieldState { field: snapshots.1 },
            );
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            if let Some(mut room) = state.rooms.get_mut(&room_id) {
                let as_player = room.join(connection, player_name.as_deref());
                let (game_state, field) = room.snapshots();
                drop(room); // Release lock before sending

                state.conn_rooms.insert(connection, room_id);
                state.send_to(
                    connection,
                    ServerMessage::JoinedRoom {
                        room_id,
                        player: as_player,
                    },
                );
                state.send_to(connection, ServerMessage::GameState { state: game_state });
                state.send_to(connection, ServerMessage::FieldState { field });
            } else {
                state.send_to(
                    connection,
                    ServerMessage::Error {
                        message: "Room not found".to_string(),
                    },
                );
            }
        }

        ClientMessage::LeaveRoom => {
            if leave_current_room(connection, state) {
                state.send_to(connection, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::JoinTeam { team } => {
            apply_action(connection, GameAction::JoinTeam { team }, state);
        }

        ClientMessage::Start { columns, height } => {
            apply_action(connection, GameAction::Start { columns, height }, state);
        }

        ClientMessage::Move { column } => {
            apply_action(connection, GameAction::Move { column }, state);
        }

        ClientMessage::Ping => {
            state.send_to(connection, ServerMessage::Pong);
        }
    }
}

/// Run one game action to completion under the room's lock, then publish.
fn apply_action(connection: Uuid, action: GameAction, state: &Arc<ServerState>) {
    let Some(&room_id) = state.conn_rooms.get(&connection).as_deref() else {
        state.send_to(
            connection,
            ServerMessage::Error {
                message: "Not in a room".to_string(),
            },
        );
        return;
    };

    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };
    match room.apply(connection, action) {
        Ok(events) => {
            drop(room);
            state.send_to(
                connection,
                ServerMessage::ActionResult {
                    success: true,
                    error: None,
                },
            );
            state.publish_events(room_id, events);
        }
        Err(e) => {
            drop(room);
            state.send_to(
                connection,
                ServerMessage::ActionResult {
                    success: false,
                    error: Some(e.to_string()),
                },
            );
        }
    }
}

/// Detach a connection from its room, publishing any forced reset.
/// Returns false if the connection was in no room.
fn leave_current_room(connection: Uuid, state: &Arc<ServerState>) -> bool {
    let Some((_, room_id)) = state.conn_rooms.remove(&connection) else {
        return false;
    };

    let should_remove = {
        if let Some(mut room) = state.rooms.get_mut(&room_id) {
            let (events, is_empty) = room.leave(connection);
            drop(room);
            if !is_empty {
                state.publish_events(room_id, events);
            }
            is_empty
        } else {
            false
        }
    };

    if should_remove {
        state.rooms.remove(&room_id);
    }
    true
}

/// Handle connection drop: an ordinary serialized room action.
fn handle_disconnect(connection: Uuid, state: &Arc<ServerState>) {
    leave_current_room(connection, state);
}
