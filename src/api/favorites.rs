/// Favorites REST API endpoints
///
/// Thin HTTP surface over `FavoritesService`. Every operation runs on a
/// background task and is reported as data, empty or error.

use crate::{
    sync::{FavoritesService, ViewState},
    workflow::Workflows,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Favorites store and sync layer
    pub favorites: FavoritesService,
}

/// Favorite membership of one workflow
#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub id: String,
    pub favorite: bool,
}

/// Create favorites routes
pub fn create_favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/api/favorites", get(list_favorites))
        .route("/api/favorites/{id}", get(favorite_detail))
        .route("/api/favorites/{id}/status", get(favorite_status))
        .route("/api/favorites/{id}/toggle", post(toggle_favorite))
        .route("/api/workflows/sync", post(sync_workflows))
}

/// List favorite workflows
///
/// GET /api/favorites
/// Returns: { "workflows": [...] }, or 204 when there are none
async fn list_favorites(State(state): State<AppState>) -> Response {
    let result = state.favorites.spawn_list_favorites().await;
    match ViewState::from_list(result) {
        ViewState::Data(workflows) => Json(json!({ "workflows": workflows })).into_response(),
        other => respond(other, StatusCode::NO_CONTENT),
    }
}

/// Offline detail of one favorite
///
/// GET /api/favorites/{id}
async fn favorite_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.favorites.spawn_favorite_detail(id).await;
    respond(ViewState::from_lookup(result), StatusCode::NOT_FOUND)
}

/// GET /api/favorites/{id}/status
async fn favorite_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state
        .favorites
        .spawn_is_favorite(id.clone())
        .await
        .map(|favorite| FavoriteStatus { id, favorite });
    respond(ViewState::from_value(result), StatusCode::NO_CONTENT)
}

/// Flip favorite state
///
/// POST /api/favorites/{id}/toggle
/// Returns: { "id": "...", "favorite": true|false }; 404 when the workflow is unknown
async fn toggle_favorite(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state
        .favorites
        .spawn_toggle_favorite(id.clone())
        .await
        .map(|favorite| FavoriteStatus { id, favorite });
    respond(ViewState::from_lookup(result), StatusCode::NOT_FOUND)
}

/// Annotate a remote listing with favorite flags
///
/// POST /api/workflows/sync
/// Body: { "workflows": [{ "id": "...", "title": "..." }, ...] }
async fn sync_workflows(
    State(state): State<AppState>,
    Json(payload): Json<Workflows>,
) -> Response {
    let result = state.favorites.spawn_sync_remote_collection(payload).await;
    respond(ViewState::from_value(result), StatusCode::NO_CONTENT)
}

fn respond<T: Serialize>(view: ViewState<T>, empty: StatusCode) -> Response {
    match view {
        ViewState::Data(data) => Json(data).into_response(),
        ViewState::Empty => empty.into_response(),
        ViewState::Error(message) => {
            tracing::error!("Favorites request failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response()
        }
    }
}
