//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! server startup, the status endpoint, and graceful shutdown handling.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    http,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracker_server::{
    store::{MemoryStore, PostgresStore},
    FleetStore, ShutdownState, TrackerServer,
};

/// Main application struct.
///
/// The `Application` struct manages the complete lifecycle of the FleetTrack
/// server: configuration loading, store selection, server initialization, the
/// HTTP status endpoint, and graceful shutdown handling.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Tracker server instance
    server: TrackerServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings,
    /// connects the configured store backend, and initializes the tracker
    /// server.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Connect the store backend (memory or postgres)
    /// 6. Initialize the tracker server with configuration
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        info!(
            "✅ Configuration loaded successfully from {}",
            args.config_path.display()
        );

        // Apply CLI overrides
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(status_address) = args.status_address {
            config.server.status_address = status_address;
        }

        if let Some(database_url) = args.database_url {
            config.store.backend = "postgres".to_string();
            config.store.database_url = Some(database_url);
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        // Display banner after logging is setup
        display_banner();

        // Connect the store backend
        let store = build_store(&config).await?;

        let server_config = config.to_server_config()?;
        let server = TrackerServer::new(server_config, store);

        info!("🚚 FleetTrack Server v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "📂 Config: {} | Store: {}",
            args.config_path.display(),
            config.store.backend
        );

        Ok(Self { config, server })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Starts the tracker server and the status endpoint in background tasks,
    /// waits for SIGINT/SIGTERM, then performs graceful cleanup.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting FleetTrack Server Application");

        self.log_configuration_summary();

        let config = self.config.clone();
        let session_manager = self.server.get_session_manager();

        // Create shutdown state for coordinated shutdown
        let shutdown_state = ShutdownState::new();
        let shutdown_state_for_server = shutdown_state.clone();

        // Start server in background
        let server_handle = {
            let server = self.server;
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state_for_server).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        // Start the HTTP status endpoint
        let status_handle = {
            let status_address = config.server.status_address.parse()?;
            let session_manager = session_manager.clone();
            tokio::spawn(async move {
                if let Err(e) = http::serve_status(status_address, session_manager).await {
                    error!("❌ Status endpoint error: {e}");
                }
            })
        };

        info!("✅ FleetTrack Server is now running!");
        info!(
            "🌐 Ready to accept connections on {}",
            config.server.bind_address
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal - this will update the shared shutdown state
        let signal_shutdown_state = setup_signal_handlers().await?;

        // A second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up second shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        // Transfer shutdown state to our server's shutdown state
        if signal_shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        // Stop the status endpoint first
        status_handle.abort();

        // Wait for the accept loop to stop gracefully
        server_handle.abort();
        info!("⏳ Waiting for server task to complete gracefully...");
        if let Err(e) =
            tokio::time::timeout(tokio::time::Duration::from_secs(8), server_handle).await
        {
            warn!(
                "⏰ Server task did not complete within timeout, proceeding with cleanup: {:?}",
                e
            );
        } else {
            info!("✅ Server task completed gracefully");
        }

        // Give time for connection cleanup; disconnect hooks flip presence
        // off as the sockets close
        info!("⏳ Waiting for connections to close...");
        tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;

        let remaining = session_manager.session_count().await;
        if remaining > 0 {
            warn!("⏰ {remaining} sessions still open at shutdown");
        }

        shutdown_state.complete_shutdown();

        info!("✅ FleetTrack Server shutdown complete");

        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  📊 Status address: {}", self.config.server.status_address);
        info!("  💾 Store backend: {}", self.config.store.backend);
        info!(
            "  👥 Max connections: {}",
            self.config.server.max_connections
        );
        info!(
            "  ⏱️ Connection timeout: {}s",
            self.config.server.connection_timeout
        );
    }
}

/// Connects the store backend named in the configuration.
async fn build_store(config: &AppConfig) -> Result<Arc<dyn FleetStore>, Box<dyn std::error::Error>> {
    match config.store.backend.as_str() {
        "postgres" => {
            let url = config
                .store
                .database_url
                .as_deref()
                .ok_or("store.database_url is required for the postgres backend")?;
            info!("💾 Connecting to PostgreSQL store...");
            let store = PostgresStore::connect(url).await?;
            info!("✅ PostgreSQL store connected");
            Ok(Arc::new(store))
        }
        _ => {
            info!("💾 Using in-memory store (no persistence across restarts)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
