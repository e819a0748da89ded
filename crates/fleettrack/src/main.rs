//! Binary entry point for the FleetTrack server.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_fleettrack::init().await
}
