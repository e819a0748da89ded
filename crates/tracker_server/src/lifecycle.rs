//! Session lifecycle hooks: presence flips on admission and disconnect.
//!
//! Both hooks fire exactly once per session - admission after the gate and
//! room routing, disconnect when the owning connection handler finishes,
//! regardless of how the disconnect was triggered. A presence write failure
//! is logged and never surfaced to the connection; it must not prevent
//! admission or block cleanup.

use crate::auth::Identity;
use crate::store::{FleetStore, Presence};
use tracing::{info, warn};

/// Fires after a session is admitted and routed into its room.
///
/// Agents are marked "working"; other roles have no presence state.
pub async fn on_session_admitted(store: &dyn FleetStore, identity: &Identity) {
    if !identity.role.is_agent() {
        return;
    }
    match store.set_agent_presence(identity.id, Presence::Working).await {
        Ok(()) => info!("👷 Agent {} presence -> working", identity.id),
        Err(e) => warn!(
            "Failed to mark agent {} as working: {}",
            identity.id, e
        ),
    }
}

/// Fires when a session's connection handler finishes.
pub async fn on_session_closed(store: &dyn FleetStore, identity: &Identity) {
    if !identity.role.is_agent() {
        return;
    }
    match store.set_agent_presence(identity.id, Presence::Off).await {
        Ok(()) => info!("👋 Agent {} presence -> off", identity.id),
        Err(e) => warn!("Failed to mark agent {} as off: {}", identity.id, e),
    }
}
