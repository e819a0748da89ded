//! Integration tests for the session gate and room routing.
//!
//! Exercises the gate against seeded and failing stores without a live
//! socket: the contract under test is what `handle_connection` relies on
//! before any session state exists.

use crate::auth::{self, GateError, Identity, Role};
use crate::connection::SessionManager;
use crate::messaging::route_client_event;
use crate::rooms::Room;
use crate::store::{
    FleetStore, LocationReport, MemoryStore, PackageRecord, Presence, StoreError, UserRecord,
};
use async_trait::async_trait;

/// A store whose every operation fails, standing in for an unreachable
/// database.
struct FailingStore;

#[async_trait]
impl FleetStore for FailingStore {
    async fn find_user_by_token(&self, _token: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn insert_location(&self, _report: &LocationReport) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn update_package_status(
        &self,
        _package_id: i64,
        _status_id: i32,
        _agent_id: i64,
    ) -> Result<Option<PackageRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_agent_presence(
        &self,
        _agent_id: i64,
        _presence: Presence,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert_user(
            "agent-token",
            UserRecord {
                id: 7,
                display_name: "rider-7".to_string(),
                role_id: 2,
            },
        )
        .await;
    store
        .insert_user(
            "observer-token",
            UserRecord {
                id: 1,
                display_name: "dispatch".to_string(),
                role_id: 1,
            },
        )
        .await;
    store
        .insert_user(
            "misfit-token",
            UserRecord {
                id: 3,
                display_name: "auditor".to_string(),
                role_id: 9,
            },
        )
        .await;
    store
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_credential_is_rejected() {
    let store = seeded_store().await;

    let result = auth::authenticate(&store, None).await;
    assert_eq!(result, Err(GateError::MissingCredential));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_credential_is_rejected() {
    let store = seeded_store().await;

    let result = auth::authenticate(&store, Some("no-such-token")).await;
    assert_eq!(result, Err(GateError::Unauthorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_store_failure_is_indistinguishable_from_unknown_credential() {
    let store = FailingStore;

    let result = auth::authenticate(&store, Some("agent-token")).await;
    assert_eq!(result, Err(GateError::Unauthorized));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_valid_credential_resolves_identity_and_role() {
    let store = seeded_store().await;

    let agent = auth::authenticate(&store, Some("agent-token")).await.unwrap();
    assert_eq!(agent.id, 7);
    assert_eq!(agent.display_name, "rider-7");
    assert_eq!(agent.role, Role::Agent);

    let observer = auth::authenticate(&store, Some("observer-token"))
        .await
        .unwrap();
    assert_eq!(observer.role, Role::Observer);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_room_routing_follows_role() {
    let sessions = SessionManager::new();
    let store = seeded_store().await;

    for (token, expected_room) in [
        ("agent-token", Some(Room::Agents)),
        ("observer-token", Some(Room::Observers)),
        ("misfit-token", None),
    ] {
        let identity = auth::authenticate(&store, Some(token)).await.unwrap();
        let connection_id = sessions.add_session("127.0.0.1:0".parse().unwrap()).await;
        sessions.set_identity(connection_id, identity.clone()).await;

        let room = Room::for_role(&identity.role);
        assert_eq!(room, expected_room);
        if let Some(room) = room {
            sessions.join_room(connection_id, room).await;
        }
    }

    assert_eq!(sessions.room_member_count(Room::Agents).await, 1);
    assert_eq!(sessions.room_member_count(Room::Observers).await, 1);
    assert_eq!(sessions.session_count().await, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_session_removal_revokes_room_membership() {
    let sessions = SessionManager::new();
    let store = seeded_store().await;

    let identity = auth::authenticate(&store, Some("agent-token")).await.unwrap();
    let connection_id = sessions.add_session("127.0.0.1:0".parse().unwrap()).await;
    sessions.set_identity(connection_id, identity).await;
    sessions.join_room(connection_id, Room::Agents).await;
    assert_eq!(sessions.room_member_count(Room::Agents).await, 1);

    sessions.remove_session(connection_id).await;
    assert_eq!(sessions.room_member_count(Room::Agents).await, 0);
    assert_eq!(sessions.session_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_router_refuses_sessions_without_identity() {
    let sessions = SessionManager::new();
    let store = MemoryStore::new();

    // A session that slipped past identity attachment must not reach any
    // channel handler.
    let connection_id = sessions.add_session("127.0.0.1:0".parse().unwrap()).await;

    let result = route_client_event(
        r#"{"event":"location-update","data":{"lat":1.0,"lng":2.0}}"#,
        connection_id,
        &sessions,
        &store,
    )
    .await;

    assert!(result.is_err());
    assert!(store.locations().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unassigned_role_is_admitted_but_inert() {
    let sessions = SessionManager::new();
    let store = seeded_store().await;

    let identity = auth::authenticate(&store, Some("misfit-token")).await.unwrap();
    assert_eq!(identity.role, Role::Unassigned(9));

    let connection_id = sessions.add_session("127.0.0.1:0".parse().unwrap()).await;
    sessions.set_identity(connection_id, identity).await;

    // No room, and location reports from it are dropped
    route_client_event(
        r#"{"event":"location-update","data":{"lat":1.0,"lng":2.0}}"#,
        connection_id,
        &sessions,
        &store,
    )
    .await
    .unwrap();
    assert!(store.locations().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_identity_is_fixed_for_session_lifetime() {
    let sessions = SessionManager::new();
    let store = seeded_store().await;

    let identity = auth::authenticate(&store, Some("agent-token")).await.unwrap();
    let connection_id = sessions.add_session("127.0.0.1:0".parse().unwrap()).await;
    sessions.set_identity(connection_id, identity.clone()).await;

    let attached: Identity = sessions.identity(connection_id).await.unwrap();
    assert_eq!(attached, identity);
}
