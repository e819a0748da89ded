//! Message type definitions for client-server communication.
//!
//! Every frame in both directions is a JSON envelope with a named event and
//! a payload:
//!
//! ```json
//! { "event": "location-update", "data": { "lat": 10.0, "lng": 20.0 } }
//! ```
//!
//! Field names on the wire are fixed by the pre-existing clients
//! (`deliveryId`, `usuario`, `packageId`, `statusId`), hence the serde
//! renames.

use crate::store::PackageRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message envelope, inbound or outbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    /// The event name (e.g. "location-update", "package-status-update")
    pub event: String,

    /// The message payload as a JSON value
    pub data: serde_json::Value,
}

/// Inbound `location-update` payload from an agent session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
}

/// Inbound `package-status-update` command. The acting agent is implicit:
/// it is always the issuing session's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStatusUpdate {
    pub package_id: i64,
    pub status_id: i32,
}

/// Outbound `location-broadcast` event sent to the observer room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBroadcast {
    pub delivery_id: i64,
    pub usuario: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

/// Outbound `package-status-updated` reply to the originating session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateReply {
    pub success: bool,

    /// The updated record, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageRecord>,

    /// Failure message, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusUpdateReply {
    pub fn ok(package: PackageRecord) -> Self {
        Self {
            success: true,
            package: Some(package),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            package: None,
            error: Some(error.into()),
        }
    }
}

/// Serializes an outbound envelope for a named event.
pub fn outbound(event: &str, data: impl Serialize) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&serde_json::json!({
        "event": event,
        "data": data,
    }))
}
