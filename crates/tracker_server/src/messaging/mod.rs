//! Wire message types and event routing.

pub mod router;
pub mod types;

pub use router::route_client_event;
pub use types::{
    outbound, ClientEnvelope, LocationBroadcast, LocationUpdate, PackageStatusUpdate,
    StatusUpdateReply,
};
