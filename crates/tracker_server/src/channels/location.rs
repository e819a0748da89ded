//! The location channel: agent position reports.
//!
//! Persist first, then broadcast to the observer room. Location telemetry
//! is lossy: a persistence failure is logged and swallowed, and it must not
//! crash or disconnect the session. No rate limiting happens here; clients
//! are expected to throttle themselves (roughly one report every ten
//! seconds).

use crate::auth::Identity;
use crate::connection::SessionManager;
use crate::messaging::{outbound, LocationBroadcast, LocationUpdate};
use crate::rooms::Room;
use crate::store::{FleetStore, LocationReport};
use chrono::Utc;
use tracing::{error, trace, warn};

/// Handles one `location-update` event from a session.
///
/// Precondition: the issuing session's role is Agent. Events from any other
/// role are silently ignored - this channel has no effect for non-agents.
///
/// On successful persist, exactly one `location-broadcast` envelope is
/// queued for every current member of the observer room, fire-and-forget.
pub async fn handle_location_update(
    sessions: &SessionManager,
    store: &dyn FleetStore,
    identity: &Identity,
    payload: LocationUpdate,
) {
    if !identity.role.is_agent() {
        trace!(
            "Ignoring location-update from non-agent user {}",
            identity.id
        );
        return;
    }

    let report = LocationReport {
        agent_id: identity.id,
        lat: payload.lat,
        lng: payload.lng,
        observed_at: Utc::now(),
    };

    if let Err(e) = store.insert_location(&report).await {
        // Log and carry on, the session stays up.
        warn!("Failed to persist location for agent {}: {}", identity.id, e);
        return;
    }

    let broadcast = LocationBroadcast {
        delivery_id: report.agent_id,
        usuario: identity.display_name.clone(),
        lat: report.lat,
        lng: report.lng,
        timestamp: report.observed_at,
    };

    match outbound("location-broadcast", &broadcast) {
        Ok(bytes) => {
            sessions.broadcast_to_room(Room::Observers, bytes).await;
        }
        Err(e) => error!("Failed to serialize location broadcast: {}", e),
    }
}
