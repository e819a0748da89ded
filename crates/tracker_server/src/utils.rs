//! Utility functions and helper methods for the tracker server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, server::TrackerServer, store::{FleetStore, MemoryStore}};
use std::sync::Arc;

/// Creates a new tracker server with default configuration and an
/// in-memory store.
///
/// This is a convenience function for quickly setting up a server with
/// sensible defaults for development and testing.
pub fn create_server() -> TrackerServer {
    TrackerServer::new(ServerConfig::default(), Arc::new(MemoryStore::new()))
}

/// Creates a new tracker server with custom configuration and store.
///
/// # Arguments
///
/// * `config` - A `ServerConfig` instance with desired settings
/// * `store` - The persistent store collaborator to use
pub fn create_server_with_store(config: ServerConfig, store: Arc<dyn FleetStore>) -> TrackerServer {
    TrackerServer::new(config, store)
}
