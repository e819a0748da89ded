//! Session management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! session tracking, identity attachment, room membership, and message
//! delivery.

pub mod manager;
pub mod session;

pub use manager::SessionManager;
pub use session::Session;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client sessions
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
