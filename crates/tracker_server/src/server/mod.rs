//! Server orchestration: accept loop and connection handling.

pub mod core;
pub mod handlers;

pub use core::TrackerServer;
