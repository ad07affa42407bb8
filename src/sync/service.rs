/// Favorites service
///
/// Merges remote workflow listings with the favorites namespace and exposes
/// the favorite read/toggle operations used by the presentation layer.

use crate::{
    store::{document::same_id, DocumentStore, LocalStore, Row, StoreError},
    sync::{
        pending::Pending,
        remote::{FetchOptions, RemoteCatalog},
    },
    workflow::{FavoriteWorkflow, RowSchema, Workflow, Workflows},
};
use anyhow::Result;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::RwLock;

/// Namespace holding favorite workflows unless configured otherwise
pub const FAVORITES_NAMESPACE: &str = "favorite_workflows";

/// Most remote records kept for toggles; the oldest are dropped first
const SEEN_CAPACITY: usize = 1024;

/// Favorites read/write surface over the local store and the remote catalog
///
/// Cheap to clone; clones share the store, the remote and the record cache.
#[derive(Debug, Clone)]
pub struct FavoritesService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: LocalStore,
    namespace: String,
    remote: Arc<dyn RemoteCatalog>,
    /// Lets a toggle serialise the row without a network round trip
    seen: RwLock<SeenRecords>,
}

impl FavoritesService {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteCatalog>) -> Self {
        Self::with_namespace(store, remote, FAVORITES_NAMESPACE)
    }

    pub fn with_namespace(
        store: LocalStore,
        remote: Arc<dyn RemoteCatalog>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                namespace: namespace.into(),
                remote,
                seen: RwLock::new(SeenRecords::new(SEEN_CAPACITY)),
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Every favorite in stored order
    ///
    /// Rows missing columns are re-fetched from the remote and written back;
    /// when the remote is unavailable the partial local copy is returned.
    pub async fn list_favorites(&self) -> Result<Vec<Workflow>> {
        let store = self.favorites();
        let rows = store.get_all().await?;

        let mut favorites = Vec::with_capacity(rows.len());
        let mut refreshed = Vec::new();

        for row in rows {
            let mut values = row.into_values();
            // Bulk reads append the id as the last value
            let Some(id) = values.pop() else { continue };
            let local = FavoriteWorkflow::from_row(&Row::new(values));

            match local {
                Ok(favorite) if !favorite.partial => favorites.push(favorite.workflow),
                local => match self.inner.remote.fetch_workflow(&id).await {
                    Ok(workflow) => {
                        let favorited_at = local
                            .as_ref()
                            .map(|f| f.favorited_at.clone())
                            .unwrap_or_default();
                        let favorite = FavoriteWorkflow::with_timestamp(&workflow, favorited_at);
                        refreshed.push(favorite.to_row());
                        favorites.push(favorite.workflow);
                    }
                    Err(e) => match local {
                        Ok(favorite) => {
                            tracing::debug!("Using partial row for '{}': {}", id, e);
                            favorites.push(favorite.workflow);
                        }
                        Err(row_err) => {
                            tracing::warn!("Skipping favorite '{}': {} ({})", id, row_err, e);
                        }
                    },
                },
            }
        }

        if !refreshed.is_empty() {
            if let Err(e) = store.update_all(refreshed).await {
                tracing::warn!("Could not write back refreshed favorites: {}", e);
            }
        }

        Ok(favorites)
    }

    /// Offline detail of a single favorite
    pub async fn favorite_detail(&self, id: &str) -> Result<FavoriteWorkflow> {
        let row = self.favorites().get(id).await?;
        Ok(FavoriteWorkflow::from_row(&row)?)
    }

    pub async fn is_favorite(&self, id: &str) -> Result<bool> {
        Ok(self.favorites().contains(id).await?)
    }

    /// Flip the favorite state of `id`, returning the new state
    ///
    /// Marking a favorite needs the workflow's details: the last synced
    /// record is used when available, otherwise it is fetched. Fails with
    /// `StoreError::NotFound` when neither source knows the workflow.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let store = self.favorites();

        let row = if store.contains(id).await? {
            None
        } else {
            Some(self.resolve(id).await?.to_row())
        };

        let favorite = match store.toggle(id, row).await {
            Ok(favorite) => favorite,
            // A concurrent toggle removed it after the membership check
            Err(e) if e.is_not_found() => {
                let row = self.resolve(id).await?.to_row();
                store.toggle(id, Some(row)).await?
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            "{} favorite '{}'",
            if favorite { "⭐ Added" } else { "🗑️ Removed" },
            id
        );
        Ok(favorite)
    }

    /// Annotate a remote listing with favorite flags
    ///
    /// Records are otherwise returned untouched. Stored rows of favorites in
    /// the listing are refreshed with the remote values.
    pub async fn sync_remote_collection(&self, remote: Workflows) -> Result<Workflows> {
        let store = self.favorites();
        let stored: HashMap<String, FavoriteWorkflow> = store
            .get_all()
            .await?
            .into_iter()
            .filter_map(|row| {
                let mut values = row.into_values();
                let id = values.pop()?;
                let favorite = FavoriteWorkflow::from_row(&Row::new(values)).ok();
                Some((id.to_lowercase(), favorite?))
            })
            .collect();
        let ids = store.ids().await?;

        {
            let mut seen = self.inner.seen.write().await;
            for workflow in &remote.workflows {
                seen.insert(workflow.clone());
            }
        }

        let mut refreshed = Vec::new();
        let workflows: Vec<Workflow> = remote
            .workflows
            .into_iter()
            .map(|workflow| {
                let favorite = ids.iter().any(|id| same_id(id, &workflow.id));
                if favorite {
                    if let Some(row) = refreshed_row(stored.get(&workflow.id.to_lowercase()), &workflow) {
                        refreshed.push(row);
                    }
                }
                Workflow { favorite, ..workflow }
            })
            .collect();

        if !refreshed.is_empty() {
            match store.update_all(refreshed).await {
                Ok(count) => tracing::debug!("Refreshed {} stored favorite(s)", count),
                // A concurrent toggle removed one of them; the flags above stay as read
                Err(e) => tracing::warn!("Skipped refreshing stored favorites: {}", e),
            }
        }

        Ok(Workflows { workflows })
    }

    /// Single-record form of `sync_remote_collection`
    pub async fn sync_remote_workflow(&self, workflow: Workflow) -> Result<Workflow> {
        let id = workflow.id.clone();
        self.sync_remote_collection(Workflows::from(vec![workflow]))
            .await?
            .workflows
            .pop()
            .ok_or_else(|| anyhow::anyhow!("sync dropped workflow '{}'", id))
    }

    /// Fetch a listing from the remote catalog and merge it
    pub async fn fetch_and_sync(&self, options: &FetchOptions) -> Result<Workflows> {
        let remote = self.inner.remote.fetch_workflows(options).await?;
        self.sync_remote_collection(remote).await
    }

    pub fn spawn_list_favorites(&self) -> Pending<Vec<Workflow>> {
        let service = self.clone();
        Pending::spawn(async move { service.list_favorites().await })
    }

    pub fn spawn_favorite_detail(&self, id: impl Into<String>) -> Pending<FavoriteWorkflow> {
        let (service, id) = (self.clone(), id.into());
        Pending::spawn(async move { service.favorite_detail(&id).await })
    }

    pub fn spawn_is_favorite(&self, id: impl Into<String>) -> Pending<bool> {
        let (service, id) = (self.clone(), id.into());
        Pending::spawn(async move { service.is_favorite(&id).await })
    }

    pub fn spawn_toggle_favorite(&self, id: impl Into<String>) -> Pending<bool> {
        let (service, id) = (self.clone(), id.into());
        Pending::spawn(async move { service.toggle_favorite(&id).await })
    }

    pub fn spawn_sync_remote_collection(&self, remote: Workflows) -> Pending<Workflows> {
        let service = self.clone();
        Pending::spawn(async move { service.sync_remote_collection(remote).await })
    }

    fn favorites(&self) -> DocumentStore {
        self.inner.store.collection(self.inner.namespace.clone())
    }

    async fn resolve(&self, id: &str) -> Result<FavoriteWorkflow> {
        let cached = self.inner.seen.read().await.get(id).cloned();

        let workflow = match cached {
            Some(workflow) => workflow,
            None => match self.inner.remote.fetch_workflow(id).await {
                Ok(workflow) => workflow,
                Err(e) => {
                    tracing::debug!("Remote lookup of '{}' failed: {}", id, e);
                    return Err(StoreError::not_found(&self.inner.namespace, id).into());
                }
            },
        };
        Ok(FavoriteWorkflow::from_workflow(&workflow))
    }
}

/// Remote records from recent syncs, keyed case-insensitively by id
#[derive(Debug)]
struct SeenRecords {
    records: HashMap<String, Workflow>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenRecords {
    fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, id: &str) -> Option<&Workflow> {
        self.records.get(&id.to_lowercase())
    }

    fn insert(&mut self, workflow: Workflow) {
        let key = workflow.id.to_lowercase();
        if self.records.insert(key.clone(), workflow).is_some() {
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.records.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Row to write back for a stored favorite, or `None` when it is unchanged
fn refreshed_row(stored: Option<&FavoriteWorkflow>, remote: &Workflow) -> Option<Row> {
    let favorited_at = stored.map(|f| f.favorited_at.clone()).unwrap_or_default();
    let candidate = FavoriteWorkflow::with_timestamp(remote, favorited_at);

    match stored {
        Some(current) if !current.partial && current.workflow == candidate.workflow => None,
        _ => Some(candidate.to_row()),
    }
}
