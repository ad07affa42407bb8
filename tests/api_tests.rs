//! HTTP surface over the favorites service

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use workflow_favorites::{
    server::build_router,
    store::{LocalStore, MemorySubstrate, Substrate},
    sync::{FavoritesService, StaticCatalog},
    workflow::Workflow,
};

fn app() -> Router {
    let substrate: Arc<dyn Substrate> = Arc::new(MemorySubstrate::new());
    let remote = StaticCatalog::new(vec![
        Workflow::new("wf-123", "Protein Folding Workflow"),
        Workflow::new("wf-200", "Sequence Alignment"),
    ]);
    build_router(FavoritesService::new(LocalStore::new(substrate), Arc::new(remote)))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<Value>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = (!bytes.is_empty()).then(|| serde_json::from_slice(&bytes).unwrap());
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_favorites_is_no_content() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/favorites", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());
}

#[tokio::test]
async fn test_toggle_then_list_and_detail() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/api/favorites/wf-123/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Some(json!({"id": "wf-123", "favorite": true})));

    let (status, body) = call(&app, Method::GET, "/api/favorites", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["workflows"][0]["title"], "Protein Folding Workflow");

    let (status, body) = call(&app, Method::GET, "/api/favorites/wf-123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["workflow"]["id"], "wf-123");

    let (_, body) = call(&app, Method::GET, "/api/favorites/wf-123/status", None).await;
    assert_eq!(body, Some(json!({"id": "wf-123", "favorite": true})));

    let (_, body) = call(&app, Method::POST, "/api/favorites/wf-123/toggle", None).await;
    assert_eq!(body, Some(json!({"id": "wf-123", "favorite": false})));

    let (status, _) = call(&app, Method::GET, "/api/favorites/wf-123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggle_unknown_workflow_is_not_found() {
    let app = app();
    let (status, _) = call(&app, Method::POST, "/api/favorites/nope/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_marks_favorites() {
    let app = app();
    call(&app, Method::POST, "/api/favorites/wf-200/toggle", None).await;

    let listing = json!({
        "workflows": [
            {"id": "wf-123", "title": "Protein Folding Workflow"},
            {"id": "wf-200", "title": "Sequence Alignment"}
        ]
    });
    let (status, body) = call(&app, Method::POST, "/api/workflows/sync", Some(listing)).await;
    assert_eq!(status, StatusCode::OK);

    let body = body.unwrap();
    assert_eq!(body["workflows"][0]["favorite"], false);
    assert_eq!(body["workflows"][1]["favorite"], true);
}
