//! Role-based broadcast rooms.
//!
//! Membership is an explicit registry (room -> set of session ids) owned by
//! the session manager, mutated only by the admission and disconnect paths.
//! A session belongs to at most one room, chosen by role at admission time;
//! membership is revoked implicitly on disconnect, never explicitly.

use crate::auth::Role;
use crate::connection::ConnectionId;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Named broadcast groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Supervisors receiving location and package-status broadcasts
    Observers,
    /// Connected delivery agents
    Agents,
}

impl Room {
    /// Room assignment policy: observers and agents each get a room,
    /// unassigned roles join nothing.
    pub fn for_role(role: &Role) -> Option<Room> {
        match role {
            Role::Observer => Some(Room::Observers),
            Role::Agent => Some(Room::Agents),
            Role::Unassigned(_) => None,
        }
    }
}

/// Explicit mapping from room to the set of member sessions.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<Room, HashSet<ConnectionId>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session to a room. Idempotent.
    pub async fn join(&self, room: Room, connection_id: ConnectionId) {
        self.rooms
            .write()
            .await
            .entry(room)
            .or_default()
            .insert(connection_id);
    }

    /// Removes a session from every room it belongs to. Called once from
    /// the disconnect path.
    pub async fn remove_session(&self, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.remove(&connection_id);
        }
    }

    /// Snapshot of a room's current members.
    pub async fn members(&self, room: Room) -> Vec<ConnectionId> {
        self.rooms
            .read()
            .await
            .get(&room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of sessions currently in a room.
    pub async fn member_count(&self, room: Room) -> usize {
        self.rooms
            .read()
            .await
            .get(&room)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_assignment_policy() {
        assert_eq!(Room::for_role(&Role::Observer), Some(Room::Observers));
        assert_eq!(Room::for_role(&Role::Agent), Some(Room::Agents));
        assert_eq!(Room::for_role(&Role::Unassigned(5)), None);
    }

    #[tokio::test]
    async fn membership_is_revoked_on_session_removal() {
        let registry = RoomRegistry::new();
        registry.join(Room::Observers, 1).await;
        registry.join(Room::Observers, 2).await;
        registry.join(Room::Agents, 3).await;

        assert_eq!(registry.member_count(Room::Observers).await, 2);

        registry.remove_session(1).await;
        assert_eq!(registry.member_count(Room::Observers).await, 1);
        assert_eq!(registry.members(Room::Observers).await, vec![2]);

        // Removing an unknown session is a no-op
        registry.remove_session(99).await;
        assert_eq!(registry.member_count(Room::Agents).await, 1);
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let registry = RoomRegistry::new();
        registry.join(Room::Agents, 7).await;
        registry.join(Room::Agents, 7).await;
        assert_eq!(registry.member_count(Room::Agents).await, 1);
    }
}
