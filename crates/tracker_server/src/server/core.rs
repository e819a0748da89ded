//! Core tracker server implementation.
//!
//! This module contains the main `TrackerServer` struct and its
//! implementation, orchestrating the accept loop, session management, and
//! the persistent store collaborator.

use crate::{
    config::ServerConfig,
    connection::SessionManager,
    error::ServerError,
    server::handlers::handle_connection,
    shutdown::ShutdownState,
    store::FleetStore,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// The core tracker server structure.
///
/// `TrackerServer` owns the session manager and the store handle and runs
/// the accept loop. All business behavior lives in the channel handlers;
/// the server itself only admits connections (through the session gate) and
/// keeps them serviced until disconnect or shutdown.
pub struct TrackerServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Manager for client sessions, rooms, and messaging
    session_manager: Arc<SessionManager>,

    /// The persistent store collaborator
    store: Arc<dyn FleetStore>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl TrackerServer {
    /// Creates a new tracker server with the specified configuration and
    /// store.
    ///
    /// The server is ready to start after construction; no I/O happens
    /// here.
    pub fn new(config: ServerConfig, store: Arc<dyn FleetStore>) -> Self {
        let session_manager = Arc::new(SessionManager::new());
        let (shutdown_sender, _) = broadcast::channel(1);

        Self {
            config,
            session_manager,
            store,
            shutdown_sender,
        }
    }

    /// Starts the server and begins accepting connections with graceful
    /// shutdown support.
    ///
    /// # Arguments
    ///
    /// * `shutdown_state` - Shared shutdown state for coordinating graceful shutdown
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        self.start_internal(Some(shutdown_state)).await
    }

    /// Starts the server and begins accepting connections.
    ///
    /// Runs until the internal shutdown signal is sent via [`Self::shutdown`].
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_internal(None).await
    }

    /// Internal method for starting the server with optional shutdown state.
    async fn start_internal(
        &self,
        shutdown_state: Option<ShutdownState>,
    ) -> Result<(), ServerError> {
        info!("🚀 Starting tracker server on {}", self.config.bind_address);

        let listener = tokio::net::TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind listener: {e}")))?;

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        let accept_loop = {
            let session_manager = self.session_manager.clone();
            let store = self.store.clone();
            let max_connections = self.config.max_connections;
            let shutdown_state = shutdown_state.clone();

            async move {
                loop {
                    // Check if shutdown has been initiated
                    if let Some(ref shutdown_state) = shutdown_state {
                        if shutdown_state.is_shutdown_initiated() {
                            info!("🛑 Accept loop stopping - shutdown initiated");
                            break;
                        }
                    }

                    match listener.accept().await {
                        Ok((stream, addr)) => {
                            let session_manager = session_manager.clone();
                            let store = store.clone();

                            // Spawn individual connection handler
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(
                                    stream,
                                    addr,
                                    session_manager,
                                    store,
                                    max_connections,
                                )
                                .await
                                {
                                    error!("Connection error: {:?}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            break;
                        }
                    }
                }
            }
        };

        // Run until shutdown is initiated or internal shutdown signal
        tokio::select! {
            _ = accept_loop => {}
            _ = shutdown_receiver.recv() => {
                info!("Internal shutdown signal received");
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Initiates server shutdown.
    ///
    /// Signals the accept loop to stop; existing connections drain on their
    /// own as clients disconnect.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        let _ = self.shutdown_sender.send(());
        Ok(())
    }

    /// Gets a reference to the session manager.
    ///
    /// Exposed for the status endpoint and for tests.
    pub fn get_session_manager(&self) -> Arc<SessionManager> {
        self.session_manager.clone()
    }

    /// Gets a handle to the persistent store collaborator.
    pub fn get_store(&self) -> Arc<dyn FleetStore> {
        self.store.clone()
    }
}
