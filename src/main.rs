/// Entry point for the workflow favorites server.

use workflow_favorites::{config::Config, server::start_server};

/// Serves:
/// - Favorites API at /api/favorites/*
/// - Listing sync at /api/workflows/sync
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Defaults to 0.0.0.0:3004 and data/preferences.db, overridable via WF_FAVORITES_*
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
