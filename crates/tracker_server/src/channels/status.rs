//! The status channel: package state transitions.
//!
//! Any session may attempt the command; the real gate is the ownership
//! predicate inside the store's conditional update. A miss (wrong agent or
//! no such package) is a normal, expected outcome - stale client state is
//! common - so it is reported back to the caller synchronously and never
//! escalated to a disconnect or a fatal log.

use crate::auth::Identity;
use crate::connection::{ConnectionId, SessionManager};
use crate::messaging::{outbound, PackageStatusUpdate, StatusUpdateReply};
use crate::rooms::Room;
use crate::store::FleetStore;
use tracing::{debug, error, warn};

/// Handles one `package-status-update` command from a session.
///
/// The store performs a single atomic conditional write: set the status
/// **where** the package's assigned agent equals the issuing identity. On a
/// match the updated record is broadcast to the observer room and a success
/// reply goes to the originating session; on a miss or store failure only a
/// failure reply is sent.
pub async fn handle_status_update(
    sessions: &SessionManager,
    store: &dyn FleetStore,
    connection_id: ConnectionId,
    identity: &Identity,
    payload: PackageStatusUpdate,
) {
    let reply = match store
        .update_package_status(payload.package_id, payload.status_id, identity.id)
        .await
    {
        Ok(Some(package)) => {
            debug!(
                "📦 Package {} -> status {} by agent {}",
                package.id, package.status_id, identity.id
            );
            match outbound("package-status-changed", &package) {
                Ok(bytes) => {
                    sessions.broadcast_to_room(Room::Observers, bytes).await;
                }
                Err(e) => error!("Failed to serialize package broadcast: {}", e),
            }
            StatusUpdateReply::ok(package)
        }
        Ok(None) => {
            debug!(
                "Package {} status update refused for agent {} (not owner or missing)",
                payload.package_id, identity.id
            );
            StatusUpdateReply::failed("package not found or not assigned to this agent")
        }
        Err(e) => {
            warn!(
                "Store failure updating package {} for agent {}: {}",
                payload.package_id, identity.id, e
            );
            StatusUpdateReply::failed(e.to_string())
        }
    };

    match outbound("package-status-updated", &reply) {
        Ok(bytes) => sessions.send_to_session(connection_id, bytes).await,
        Err(e) => error!("Failed to serialize status reply: {}", e),
    }
}
