//! Event routing logic for dispatching client messages to channels.
//!
//! This module parses incoming text frames and routes them to the location
//! or status channel. The router only ever sees admitted sessions: the
//! session gate runs before the connection's read loop starts, so a
//! session without an identity here is an internal invariant violation,
//! not a protocol case.

use crate::channels;
use crate::connection::{ConnectionId, SessionManager};
use crate::error::ServerError;
use crate::messaging::{ClientEnvelope, LocationUpdate, PackageStatusUpdate};
use crate::store::FleetStore;
use tracing::{debug, trace};

/// Routes one raw client frame to the appropriate channel handler.
///
/// # Arguments
///
/// * `text` - The raw frame text (expected to be a JSON envelope)
/// * `connection_id` - The session that sent the frame
/// * `sessions` - Manager for identity lookup and message delivery
/// * `store` - The persistent store collaborator
///
/// # Returns
///
/// `Ok(())` if the frame was handled (including the no-op cases), or a
/// `ServerError` if it could not be parsed at all. Malformed payloads for
/// known events are dropped with a debug log; a bad frame must never take
/// the session down.
pub async fn route_client_event(
    text: &str,
    connection_id: ConnectionId,
    sessions: &SessionManager,
    store: &dyn FleetStore,
) -> Result<(), ServerError> {
    let envelope: ClientEnvelope = serde_json::from_str(text)
        .map_err(|e| ServerError::Network(format!("Invalid JSON: {e}")))?;

    let identity = sessions
        .identity(connection_id)
        .await
        .ok_or_else(|| ServerError::Internal("session has no identity".to_string()))?;

    debug!(
        "📨 Routing '{}' event from session {} (user {})",
        envelope.event, connection_id, identity.id
    );

    match envelope.event.as_str() {
        "location-update" => match serde_json::from_value::<LocationUpdate>(envelope.data) {
            Ok(payload) => {
                channels::location::handle_location_update(sessions, store, &identity, payload)
                    .await;
            }
            Err(e) => debug!(
                "Dropping malformed location-update from session {}: {}",
                connection_id, e
            ),
        },
        "package-status-update" => {
            match serde_json::from_value::<PackageStatusUpdate>(envelope.data) {
                Ok(payload) => {
                    channels::status::handle_status_update(
                        sessions,
                        store,
                        connection_id,
                        &identity,
                        payload,
                    )
                    .await;
                }
                Err(e) => debug!(
                    "Dropping malformed package-status-update from session {}: {}",
                    connection_id, e
                ),
            }
        }
        other => {
            debug!(
                "Dropping unknown event '{}' from session {}",
                other, connection_id
            );
        }
    }

    trace!(
        "✅ Routed '{}' frame from session {}",
        envelope.event,
        connection_id
    );
    Ok(())
}
