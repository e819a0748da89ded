//! Business event channels: location reports and package status updates.

pub mod location;
pub mod status;
