//! Favorites service: listing, toggling and merging remote collections

use std::sync::Arc;
use workflow_favorites::{
    store::{LocalStore, MemorySubstrate, Row, Substrate},
    sync::{FavoritesService, OfflineCatalog, StaticCatalog, ViewState, FAVORITES_NAMESPACE},
    workflow::{FavoriteWorkflow, RowSchema, Workflow, Workflows},
};

fn workflow(id: &str, title: &str) -> Workflow {
    let mut workflow = Workflow::new(id, title);
    workflow.description = format!("{} description", title);
    workflow.uploader = "taverna-user".to_string();
    workflow
}

fn catalog() -> Vec<Workflow> {
    vec![
        workflow("wf-123", "Protein Folding Workflow"),
        workflow("wf-200", "Sequence Alignment"),
        workflow("wf-300", "Gene Expression"),
    ]
}

fn service_with(remote: Vec<Workflow>) -> (LocalStore, FavoritesService) {
    let substrate: Arc<dyn Substrate> = Arc::new(MemorySubstrate::new());
    let store = LocalStore::new(substrate);
    let service = FavoritesService::new(store.clone(), Arc::new(StaticCatalog::new(remote)));
    (store, service)
}

// ============================================================================
// Example scenario
// ============================================================================

#[tokio::test]
async fn test_insert_toggle_list_scenario() {
    let (store, service) = service_with(catalog());

    let outcome = store
        .collection(FAVORITES_NAMESPACE)
        .insert(vec!["wf-123", "Protein Folding Workflow"])
        .await
        .unwrap();
    assert!(outcome.is_created());

    assert!(service.is_favorite("wf-123").await.unwrap());
    assert!(!service.toggle_favorite("wf-123").await.unwrap());
    assert!(service.list_favorites().await.unwrap().is_empty());
    assert!(!service.is_favorite("wf-123").await.unwrap());
}

// ============================================================================
// Toggling
// ============================================================================

#[tokio::test]
async fn test_toggle_uses_synced_record() {
    // Remote knows nothing; the record must come from the sync
    let (_, service) = service_with(Vec::new());
    service
        .sync_remote_collection(Workflows::from(catalog()))
        .await
        .unwrap();

    assert!(service.toggle_favorite("wf-200").await.unwrap());

    let detail = service.favorite_detail("wf-200").await.unwrap();
    assert_eq!(detail.workflow.title, "Sequence Alignment");
    assert_eq!(detail.workflow.uploader, "taverna-user");
    assert!(!detail.favorited_at.is_empty());
    assert!(!detail.partial);
}

#[tokio::test]
async fn test_toggle_fetches_unknown_record_from_remote() {
    let (_, service) = service_with(catalog());

    assert!(service.toggle_favorite("wf-300").await.unwrap());
    let favorites = service.list_favorites().await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].title, "Gene Expression");
    assert!(favorites[0].favorite);
}

#[tokio::test]
async fn test_toggle_unknown_workflow_is_not_found() {
    let (_, service) = service_with(catalog());

    let result = service.toggle_favorite("wf-unknown").await;
    assert_eq!(ViewState::from_lookup(result), ViewState::Empty);
    assert!(!service.is_favorite("wf-unknown").await.unwrap());
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_preserves_stored_order() {
    let (_, service) = service_with(catalog());
    for id in ["wf-300", "wf-123", "wf-200"] {
        assert!(service.toggle_favorite(id).await.unwrap());
    }

    let ids: Vec<String> = service
        .list_favorites()
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, ["wf-300", "wf-123", "wf-200"]);
}

#[tokio::test]
async fn test_partial_row_is_refetched_and_written_back() {
    let (store, service) = service_with(catalog());
    let favorites = store.collection(FAVORITES_NAMESPACE);
    favorites.insert(vec!["wf-200", "Old title"]).await.unwrap();

    let listed = service.list_favorites().await.unwrap();
    assert_eq!(listed[0].title, "Sequence Alignment");
    assert_eq!(listed[0].description, "Sequence Alignment description");

    let row = favorites.get("wf-200").await.unwrap();
    assert_eq!(row.len(), FavoriteWorkflow::COLUMNS.len());
    assert_eq!(row.get(1), Some("Sequence Alignment"));
}

#[tokio::test]
async fn test_partial_row_served_when_offline() {
    let substrate: Arc<dyn Substrate> = Arc::new(MemorySubstrate::new());
    let store = LocalStore::new(substrate);
    let service = FavoritesService::new(store.clone(), Arc::new(OfflineCatalog));

    store
        .collection(FAVORITES_NAMESPACE)
        .insert(vec!["wf-1", "Cached title"])
        .await
        .unwrap();
    // Too short to decode at all
    store
        .collection(FAVORITES_NAMESPACE)
        .insert(vec!["wf-2"])
        .await
        .unwrap();

    let listed = service.list_favorites().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Cached title");
}

#[tokio::test]
async fn test_detail_of_missing_favorite_is_empty_view() {
    let (_, service) = service_with(catalog());
    let view = ViewState::from_lookup(service.favorite_detail("wf-123").await);
    assert_eq!(view, ViewState::Empty);
}

// ============================================================================
// Sync / merge
// ============================================================================

#[tokio::test]
async fn test_sync_annotates_without_touching_other_fields() {
    let (_, service) = service_with(catalog());
    service.toggle_favorite("wf-123").await.unwrap();

    let remote = Workflows::from(catalog());
    let merged = service.sync_remote_collection(remote.clone()).await.unwrap();

    assert_eq!(merged.workflows.len(), remote.workflows.len());
    for (merged, original) in merged.workflows.iter().zip(&remote.workflows) {
        assert_eq!(merged.favorite, merged.id == "wf-123");
        assert_eq!(Workflow { favorite: false, ..merged.clone() }, *original);
    }
}

#[tokio::test]
async fn test_sync_refreshes_stored_favorite_keeping_timestamp() {
    let (store, service) = service_with(catalog());
    let favorites = store.collection(FAVORITES_NAMESPACE);
    let stored = FavoriteWorkflow::with_timestamp(
        &workflow("wf-123", "Stale title"),
        "2026-01-01T00:00:00+00:00".to_string(),
    );
    favorites.insert(stored.to_row()).await.unwrap();

    let synced = service
        .sync_remote_workflow(workflow("wf-123", "Fresh title"))
        .await
        .unwrap();
    assert!(synced.favorite);

    let detail = service.favorite_detail("wf-123").await.unwrap();
    assert_eq!(detail.workflow.title, "Fresh title");
    assert_eq!(detail.favorited_at, "2026-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn test_fetch_and_sync_pages_remote() {
    let (_, service) = service_with(catalog());
    service.toggle_favorite("wf-300").await.unwrap();

    let options = [("page", "2"), ("per_page", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let page = service.fetch_and_sync(&options).await.unwrap();

    assert_eq!(page.workflows.len(), 1);
    assert_eq!(page.workflows[0].id, "wf-300");
    assert!(page.workflows[0].favorite);
}

#[tokio::test]
async fn test_fetch_and_sync_huge_page_is_empty() {
    let (_, service) = service_with(catalog());

    let max = usize::MAX.to_string();
    let options = [("page", max.as_str()), ("per_page", max.as_str())]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let page = service.fetch_and_sync(&options).await.unwrap();

    assert!(page.workflows.is_empty());
}

#[tokio::test]
async fn test_fetch_and_sync_offline_is_error_view() {
    let substrate: Arc<dyn Substrate> = Arc::new(MemorySubstrate::new());
    let service = FavoritesService::new(LocalStore::new(substrate), Arc::new(OfflineCatalog));

    let view = ViewState::from_value(service.fetch_and_sync(&Default::default()).await);
    assert!(matches!(view, ViewState::Error(_)));
}

// ============================================================================
// Background handles
// ============================================================================

#[tokio::test]
async fn test_spawned_operations_resolve_once() {
    let (_, service) = service_with(catalog());

    assert!(service.spawn_toggle_favorite("wf-123").await.unwrap());
    assert!(service.spawn_is_favorite("wf-123").await.unwrap());

    let listed = service.spawn_list_favorites().await;
    assert!(matches!(ViewState::from_list(listed), ViewState::Data(ref w) if w.len() == 1));

    let merged = service
        .spawn_sync_remote_collection(Workflows::from(catalog()))
        .await
        .unwrap();
    assert_eq!(merged.workflows.iter().filter(|w| w.favorite).count(), 1);

    let detail = service.spawn_favorite_detail("wf-123").await.unwrap();
    assert_eq!(detail.id(), "wf-123");
}

#[tokio::test]
async fn test_dropped_handle_still_completes_write() {
    let (_, service) = service_with(catalog());

    drop(service.spawn_toggle_favorite("wf-200"));

    let mut attempts = 0;
    while !service.is_favorite("wf-200").await.unwrap() {
        attempts += 1;
        assert!(attempts < 100, "detached toggle never landed");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_rows_inserted_directly_decode_as_favorites() {
    let (store, service) = service_with(Vec::new());
    let row = FavoriteWorkflow::from_workflow(&workflow("wf-9", "Imported")).to_row();
    store.collection(FAVORITES_NAMESPACE).insert(row).await.unwrap();

    let listed = service.list_favorites().await.unwrap();
    assert_eq!(listed, vec![Workflow { favorite: true, ..workflow("wf-9", "Imported") }]);

    // Rows carry no extra columns beyond the schema
    let stored: Row = store.collection(FAVORITES_NAMESPACE).get("wf-9").await.unwrap();
    assert_eq!(stored.len(), FavoriteWorkflow::COLUMNS.len());
}
