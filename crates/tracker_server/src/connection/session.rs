//! Per-connection session state.

use crate::auth::Identity;
use std::net::SocketAddr;
use std::time::SystemTime;

/// The server-side state attached to one live connection.
///
/// A session starts without an identity; the session gate attaches one
/// before the session is admitted. A session that never receives an
/// identity never leaves the gate phase and never reaches a channel
/// handler.
#[derive(Debug)]
pub struct Session {
    /// The identity resolved by the session gate (None until the gate passes)
    pub identity: Option<Identity>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,
}

impl Session {
    /// Creates a new session for a connection attempt from `remote_addr`.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            identity: None,
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }
}
