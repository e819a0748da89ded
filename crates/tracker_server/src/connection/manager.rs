//! Session manager for tracking and managing client connections.
//!
//! This module provides the central management system for all client
//! sessions, handling session lifecycle, identity attachment, room
//! membership, and message broadcasting.

use super::{ConnectionId, Session};
use crate::auth::Identity;
use crate::rooms::{Room, RoomRegistry};
use futures_util::stream::SplitSink;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{tungstenite::Message, WebSocketStream};
use tracing::info;

/// Central manager for all client sessions.
///
/// The `SessionManager` tracks active sessions, assigns unique IDs, owns
/// the room registry, and provides message delivery to single sessions and
/// whole rooms. It uses async-safe data structures to handle concurrent
/// access from multiple connection handlers.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe session storage
/// * Implements atomic connection ID generation
/// * Provides a broadcast channel for outgoing messages; each connection's
///   outgoing task filters for its own ID
/// * Room membership is mutated only by the admission and disconnect paths
#[derive(Debug)]
pub struct SessionManager {
    /// Map of connection ID to session state
    sessions: Arc<RwLock<HashMap<ConnectionId, Session>>>,
    ws_senders: Arc<
        RwLock<
            HashMap<
                ConnectionId,
                Arc<tokio::sync::Mutex<SplitSink<WebSocketStream<tokio::net::TcpStream>, Message>>>,
            >,
        >,
    >,

    /// Explicit room membership registry
    rooms: RoomRegistry,

    /// Atomic counter for generating unique connection IDs
    next_id: Arc<std::sync::atomic::AtomicUsize>,

    /// Broadcast sender for outgoing messages to specific connections
    sender: broadcast::Sender<(ConnectionId, Vec<u8>)>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    ///
    /// Initializes the internal data structures and broadcast channel
    /// with a reasonable buffer size for message queuing.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ws_senders: Arc::new(RwLock::new(HashMap::new())),
            rooms: RoomRegistry::new(),
            next_id: Arc::new(std::sync::atomic::AtomicUsize::new(1)),
            sender,
        }
    }

    /// Adds a new session and returns its unique ID.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - The network address of the connecting client
    pub async fn add_session(&self, remote_addr: SocketAddr) -> ConnectionId {
        let connection_id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let session = Session::new(remote_addr);
        let mut sessions = self.sessions.write().await;
        sessions.insert(connection_id, session);
        info!("🔗 Session {} from {}", connection_id, remote_addr);
        connection_id
    }

    /// Removes a session and its room memberships.
    ///
    /// This should be called exactly once, when the owning connection
    /// handler finishes (client close, network drop, or server-initiated).
    pub async fn remove_session(&self, connection_id: ConnectionId) {
        self.rooms.remove_session(connection_id).await;
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.remove(&connection_id) {
            info!(
                "❌ Session {} from {} disconnected",
                connection_id, session.remote_addr
            );
        }
    }

    /// Register the WebSocket sender for a connection
    pub async fn register_ws_sender(
        &self,
        connection_id: ConnectionId,
        ws_sender: Arc<
            tokio::sync::Mutex<SplitSink<WebSocketStream<tokio::net::TcpStream>, Message>>,
        >,
    ) {
        let mut senders = self.ws_senders.write().await;
        senders.insert(connection_id, ws_sender);
    }

    /// Remove the WebSocket sender for a connection
    pub async fn remove_ws_sender(&self, connection_id: ConnectionId) {
        let mut senders = self.ws_senders.write().await;
        senders.remove(&connection_id);
    }

    /// Attaches a resolved identity to a session.
    ///
    /// Called exactly once per session, after the session gate passes. The
    /// identity is immutable for the session's remaining lifetime.
    pub async fn set_identity(&self, connection_id: ConnectionId, identity: Identity) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&connection_id) {
            session.identity = Some(identity);
        }
    }

    /// Retrieves the identity attached to a session.
    ///
    /// Returns `None` if the session doesn't exist or never passed the gate.
    pub async fn identity(&self, connection_id: ConnectionId) -> Option<Identity> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&connection_id)
            .and_then(|session| session.identity.clone())
    }

    /// Number of currently tracked sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Places a session into a room. Part of the admission path only.
    pub async fn join_room(&self, connection_id: ConnectionId, room: Room) {
        self.rooms.join(room, connection_id).await;
    }

    /// Number of sessions currently in a room.
    pub async fn room_member_count(&self, room: Room) -> usize {
        self.rooms.member_count(room).await
    }

    /// Queues a message for delivery to a specific session.
    pub async fn send_to_session(&self, connection_id: ConnectionId, message: Vec<u8>) {
        if let Err(e) = self.sender.send((connection_id, message)) {
            tracing::error!(
                "Failed to send message to session {}: {:?}",
                connection_id,
                e
            );
        }
    }

    /// Broadcasts a message to every current member of a room.
    ///
    /// Fire-and-forget: no acknowledgment is required from recipients and
    /// there is no retry. Delivery is best-effort to currently-connected
    /// members only.
    ///
    /// # Returns
    ///
    /// The number of sessions the message was queued for.
    pub async fn broadcast_to_room(&self, room: Room, message: Vec<u8>) -> usize {
        let members = self.rooms.members(room).await;
        let member_count = members.len();

        for connection_id in members {
            if let Err(e) = self.sender.send((connection_id, message.clone())) {
                tracing::error!(
                    "Failed to broadcast message to session {}: {:?}",
                    connection_id,
                    e
                );
            }
        }

        tracing::debug!("📡 Broadcasted message to {} sessions in {:?}", member_count, room);
        member_count
    }

    /// Creates a new receiver for outgoing messages.
    ///
    /// Each connection handler should call this to get a receiver for
    /// messages targeted to their specific connection.
    pub fn subscribe(&self) -> broadcast::Receiver<(ConnectionId, Vec<u8>)> {
        self.sender.subscribe()
    }
}
