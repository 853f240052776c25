//! Connected players and team occupancy.
//!
//! A roster tracks every connection admitted as a player, each with an
//! immutable display name and at most one team binding. Team slots hold at
//! most one occupant at a time.

use crate::board::Team;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Opaque connection handle, one per network session
pub type PlayerId = Uuid;

/// Errors from roster operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RosterError {
    #[error("a display name is required")]
    NameRequired,

    #[error("not a registered player")]
    NotRegistered,

    #[error("team is taken")]
    TeamTaken,
}

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display name, resolved once at registration
    pub name: String,
    pub team: Option<Team>,
}

/// All players currently admitted to a room.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: HashMap<PlayerId, Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Admit a connection as a player.
    ///
    /// The display name is derived from the caller-supplied candidate:
    /// whitespace is trimmed and an empty or absent candidate is rejected
    /// with `NameRequired` — such a connection may still observe, but it
    /// is never registered and cannot act.
    pub fn register(
        &mut self,
        id: PlayerId,
        candidate_name: Option<&str>,
    ) -> Result<&Player, RosterError> {
        let name = candidate_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(RosterError::NameRequired)?;

        let player = self.players.entry(id).or_insert(Player {
            id,
            name: name.to_string(),
            team: None,
        });
        Ok(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// The player holding a team slot, if any (at most one by invariant)
    pub fn team_holder(&self, team: Team) -> Option<&Player> {
        self.players.values().find(|p| p.team == Some(team))
    }

    /// Bind or vacate a player's team slot.
    ///
    /// Assigning a team already occupied by a different player fails with
    /// `TeamTaken`. Binding a new team releases any slot the player held
    /// before; `None` vacates outright.
    pub fn set_team(&mut self, id: PlayerId, team: Option<Team>) -> Result<(), RosterError> {
        if !self.players.contains_key(&id) {
            return Err(RosterError::NotRegistered);
        }
        if let Some(team) = team {
            if self.team_holder(team).is_some_and(|holder| holder.id != id) {
                return Err(RosterError::TeamTaken);
            }
        }

        if let Some(player) = self.players.get_mut(&id) {
            player.team = team;
        }
        Ok(())
    }

    /// Vacate both team slots
    pub fn clear_teams(&mut self) {
        for player in self.players.values_mut() {
            player.team = None;
        }
    }

    /// Force-kick: remove the player outright, returning its final state
    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_requires_a_name() {
        let mut roster = Roster::new();
        let id = Uuid::new_v4();

        assert_eq!(roster.register(id, None), Err(RosterError::NameRequired));
        assert_eq!(roster.register(id, Some("")), Err(RosterError::NameRequired));
        assert_eq!(
            roster.register(id, Some("   ")),
            Err(RosterError::NameRequired)
        );
        assert!(roster.is_empty());

        let player = roster.register(id, Some("  Alice ")).unwrap();
        assert_eq!(player.name, "Alice");
        assert_eq!(player.team, None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_team_slots_hold_one_player() {
        let mut roster = Roster::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        roster.register(alice, Some("Alice")).unwrap();
        roster.register(bob, Some("Bob")).unwrap();

        roster.set_team(alice, Some(Team::X)).unwrap();
        assert_eq!(
            roster.set_team(bob, Some(Team::X)),
            Err(RosterError::TeamTaken)
        );
        assert_eq!(roster.team_holder(Team::X).unwrap().name, "Alice");

        // The other slot is free
        roster.set_team(bob, Some(Team::O)).unwrap();
        assert_eq!(roster.team_holder(Team::O).unwrap().name, "Bob");
    }

    #[test]
    fn test_switching_teams_releases_the_old_slot() {
        let mut roster = Roster::new();
        let alice = Uuid::new_v4();
        roster.register(alice, Some("Alice")).unwrap();

        roster.set_team(alice, Some(Team::X)).unwrap();
        roster.set_team(alice, Some(Team::O)).unwrap();

        assert!(roster.team_holder(Team::X).is_none());
        assert_eq!(roster.team_holder(Team::O).unwrap().id, alice);
    }

    #[test]
    fn test_set_team_none_vacates() {
        let mut roster = Roster::new();
        let alice = Uuid::new_v4();
        roster.register(alice, Some("Alice")).unwrap();

        roster.set_team(alice, Some(Team::X)).unwrap();
        roster.set_team(alice, None).unwrap();
        assert!(roster.team_holder(Team::X).is_none());
    }

    #[test]
    fn test_unregistered_player_cannot_take_a_team() {
        let mut roster = Roster::new();
        assert_eq!(
            roster.set_team(Uuid::new_v4(), Some(Team::X)),
            Err(RosterError::NotRegistered)
        );
    }

    #[test]
    fn test_remove_is_a_force_kick() {
        let mut roster = Roster::new();
        let alice = Uuid::new_v4();
        roster.register(alice, Some("Alice")).unwrap();
        roster.set_team(alice, Some(Team::X)).unwrap();

        let removed = roster.remove(alice).unwrap();
        assert_eq!(removed.team, Some(Team::X));
        assert!(roster.get(alice).is_none());
        assert!(roster.team_holder(Team::X).is_none());
    }
}
