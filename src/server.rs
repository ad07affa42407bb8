/// Server setup and initialization
///
/// Wires the preference substrate, the favorites store and the HTTP routes.

use crate::{
    api::{create_favorite_routes, AppState},
    config::Config,
    store::{LocalStore, SqliteSubstrate},
    sync::{FavoritesService, OfflineCatalog},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application from configuration
///
/// Opens the SQLite preference database under the configured data directory.
/// The remote catalog is not wired here; favorites are served from local rows.
pub async fn create_app(config: &Config) -> Result<Router> {
    tracing::info!("📁 Ensuring data directory exists: {}", config.storage.data_dir);
    std::fs::create_dir_all(&config.storage.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let substrate = SqliteSubstrate::open(config.storage.db_path())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open preference database: {}", e))?;

    let store = LocalStore::new(Arc::new(substrate)).with_flush(config.storage.flush);
    let favorites = FavoritesService::with_namespace(
        store,
        Arc::new(OfflineCatalog),
        config.storage.favorites_namespace.clone(),
    );

    tracing::info!("⭐ Favorites namespace: {}", favorites.namespace());
    Ok(build_router(favorites))
}

/// Router over an already constructed favorites service
pub fn build_router(favorites: FavoritesService) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .merge(create_favorite_routes().with_state(AppState { favorites }))
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting workflow favorites server...");

    let app = create_app(&config).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
