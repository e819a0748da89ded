//! # Tracker Server - Real-Time Fleet Session Layer
//!
//! A real-time tracking server for a fleet of mobile delivery agents. Agents
//! connect over WebSocket, report their geolocation and package status
//! transitions, and a set of supervising observers connected to the same
//! server receive live broadcasts of both. Every accepted event is persisted
//! through a pluggable store before it is fanned out.
//!
//! ## Architecture Overview
//!
//! * **Session Gate** - Per-connection authentication run before any event
//!   handling is permitted. The client presents an opaque credential at
//!   connect time; the gate resolves it to an [`Identity`] or rejects the
//!   connection with a textual reason.
//! * **Room Registry** - Explicit role-based broadcast groups. Observers join
//!   the observer room, agents join the agent room, anything else stays
//!   connected but inert.
//! * **Location Channel** - Accepts agent position reports, persists them as
//!   append-only records, and broadcasts them to the observer room.
//! * **Status Channel** - Applies package status transitions through a single
//!   conditional store write (ownership enforced at write time), broadcasts
//!   successful transitions to observers, and replies to the originating
//!   session either way.
//! * **Lifecycle Hooks** - Presence flips ("working"/"off") on agent
//!   admission and disconnect.
//!
//! ## Message Flow
//!
//! 1. Client connects with `?token=...` on the upgrade request
//! 2. The session gate resolves the credential against the store
//! 3. On success the session joins its role room and lifecycle hooks fire
//! 4. Inbound `{event, data}` envelopes are routed to the channels
//! 5. Channels persist, then broadcast to the observer room best-effort
//! 6. On disconnect the session leaves its rooms and presence flips off
//!
//! ## Error Handling
//!
//! Gate failures terminate the connection attempt. Location persistence
//! failures are logged and swallowed (location telemetry is lossy). Status
//! update failures are reported back to the caller as a structured reply and
//! never disconnect the session. No handler failure crashes the process.

// Re-export core types and functions for easy access
pub use auth::{GateError, Identity, Role};
pub use config::ServerConfig;
pub use error::ServerError;
pub use rooms::Room;
pub use server::TrackerServer;
pub use shutdown::ShutdownState;
pub use store::{
    FleetStore, LocationReport, PackageRecord, Presence, StoreError, UserRecord,
};
pub use utils::{create_server, create_server_with_store};

// Public module declarations
pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod rooms;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod utils;

// Internal modules (not part of public API)
pub mod channels;
pub mod connection;
pub mod messaging;


// Session gate integration tests
#[cfg(test)]
mod gate_integration_tests;
