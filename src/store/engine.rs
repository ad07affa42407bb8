/// Document store engine
///
/// `LocalStore` owns the substrate and the namespace lock registry;
/// `DocumentStore` is a handle onto one namespace with its own private
/// staging document. Keyed mutations (`insert`, `delete`, `toggle`,
/// `update_all`, `bulk_delete`) write through immediately, while `put` and
/// `update` accumulate in staging until `save`.

use crate::store::{
    document::{same_id, CollectionDocument, Row, EMPTY_DOCUMENT, IDS_FIELD},
    error::{StoreError, StoreResult},
    id::generate_id,
    locks::NamespaceLocks,
    substrate::{FlushMode, Substrate},
};
use std::{sync::Arc, time::Instant};

/// Result of a keyed insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// The natural id was already indexed; nothing was written
    Duplicate,
}

impl InsertOutcome {
    pub fn is_created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Shared entry point for every namespace on one substrate
#[derive(Debug, Clone)]
pub struct LocalStore {
    substrate: Arc<dyn Substrate>,
    locks: Arc<NamespaceLocks>,
    flush: FlushMode,
}

impl LocalStore {
    /// Wrap `substrate` with a fresh namespace lock registry
    ///
    /// Locks are shared by clones only. Open one `LocalStore` per substrate
    /// and clone it; two stores built over the same substrate do not
    /// serialise their read-modify-write cycles against each other.
    pub fn new(substrate: Arc<dyn Substrate>) -> Self {
        Self {
            substrate,
            locks: Arc::new(NamespaceLocks::new()),
            flush: FlushMode::default(),
        }
    }

    /// Flush mode used by `delete` and `save`
    pub fn with_flush(mut self, flush: FlushMode) -> Self {
        self.flush = flush;
        self
    }

    /// Open a handle onto `namespace` with an empty staging document
    pub fn collection(&self, namespace: impl Into<String>) -> DocumentStore {
        DocumentStore {
            namespace: namespace.into(),
            substrate: Arc::clone(&self.substrate),
            locks: Arc::clone(&self.locks),
            flush: self.flush,
            staging: None,
        }
    }

    pub fn substrate(&self) -> &Arc<dyn Substrate> {
        &self.substrate
    }
}

/// Handle onto one namespace
#[derive(Debug)]
pub struct DocumentStore {
    namespace: String,
    substrate: Arc<dyn Substrate>,
    locks: Arc<NamespaceLocks>,
    flush: FlushMode,
    staging: Option<CollectionDocument>,
}

impl DocumentStore {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Insert a row keyed by its first value
    ///
    /// Returns `Duplicate` without writing when that id is already indexed
    /// (case-insensitive). Committed synchronously.
    pub async fn insert(&self, row: impl Into<Row>) -> StoreResult<InsertOutcome> {
        let row = row.into();
        let id = row
            .natural_id()
            .ok_or_else(|| StoreError::InvalidRow("row has no natural id".to_string()))?
            .to_string();
        validate_id(&id)?;

        let started = Instant::now();
        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;

        if doc.contains(&id) {
            tracing::debug!("'{}' already present in '{}'", id, self.namespace);
            return Ok(InsertOutcome::Duplicate);
        }

        doc.upsert(&id, &row);
        self.store(&doc, FlushMode::Commit).await?;

        tracing::debug!(
            "Inserted '{}' into '{}' in {:?}",
            id,
            self.namespace,
            started.elapsed()
        );
        Ok(InsertOutcome::Created)
    }

    /// Every decodable row in stored order, each with its id appended
    ///
    /// Rows that fail to decode are logged and skipped.
    pub async fn get_all(&self) -> StoreResult<Vec<Row>> {
        let doc = self.load().await?;
        let mut rows = Vec::with_capacity(doc.len());

        for (id, decoded) in doc.rows() {
            match decoded {
                Ok(mut row) => {
                    row.push(id.to_string());
                    rows.push(row);
                }
                Err(e) => tracing::warn!("Skipping row in '{}': {}", self.namespace, e),
            }
        }

        Ok(rows)
    }

    /// The row stored under `id`
    pub async fn get(&self, id: &str) -> StoreResult<Row> {
        let doc = self.load().await?;
        match doc.row(id) {
            Some(Ok(row)) => Ok(row),
            Some(Err(e)) => Err(StoreError::decode(&self.namespace, e.to_string())),
            None => Err(StoreError::not_found(&self.namespace, id)),
        }
    }

    pub async fn contains(&self, id: &str) -> StoreResult<bool> {
        Ok(self.load().await?.contains(id))
    }

    /// Indexed ids in stored order
    pub async fn ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.load().await?.ids().to_vec())
    }

    pub async fn len(&self) -> StoreResult<usize> {
        Ok(self.load().await?.len())
    }

    /// Stage `row` under a freshly generated id
    pub fn put(&mut self, row: impl Into<Row>) -> &mut Self {
        let id = generate_id();
        self.staging
            .get_or_insert_with(CollectionDocument::default)
            .upsert(&id, &row.into());
        self
    }

    /// Stage a replacement row for `id`
    ///
    /// No existence check: an id not yet persisted is appended on `save`.
    pub fn update(&mut self, id: &str, row: impl Into<Row>) -> bool {
        if let Err(e) = validate_id(id) {
            tracing::warn!("Rejected staged update in '{}': {}", self.namespace, e);
            return false;
        }
        self.staging
            .get_or_insert_with(CollectionDocument::default)
            .upsert(id, &row.into());
        true
    }

    /// Ids currently staged and not yet saved
    pub fn staged_ids(&self) -> &[String] {
        self.staging.as_ref().map(|doc| doc.ids()).unwrap_or(&[])
    }

    /// Persist staged rows; `false` when nothing was staged or the write failed
    pub async fn save(&mut self) -> bool {
        match self.try_save().await {
            Ok(_) => true,
            Err(e @ StoreError::StagingNotInitialized { .. }) => {
                tracing::debug!("{}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Save of '{}' failed: {}", self.namespace, e);
                false
            }
        }
    }

    /// Merge the staging document into the persisted one in a single write
    ///
    /// Staged ids already indexed keep their position; new ones are appended.
    /// Staging is cleared only when the write succeeds. Returns the number of
    /// rows written.
    pub async fn try_save(&mut self) -> StoreResult<usize> {
        let staged = self
            .staging
            .as_ref()
            .ok_or_else(|| StoreError::StagingNotInitialized {
                namespace: self.namespace.clone(),
            })?;

        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;

        let mut written = 0;
        for (id, row) in staged.rows() {
            // Staged rows are built from `Row` values and always decode
            if let Ok(row) = row {
                doc.upsert(id, &row);
                written += 1;
            }
        }

        self.store(&doc, self.flush).await?;
        self.staging = None;

        tracing::debug!("Saved {} staged row(s) to '{}'", written, self.namespace);
        Ok(written)
    }

    /// Remove `id` and its row in one write; also discards any staged row for it
    pub async fn delete(&mut self, id: &str) -> StoreResult<bool> {
        if let Some(staging) = self.staging.as_mut() {
            staging.remove(id);
        }

        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;

        if !doc.remove(id) {
            return Ok(false);
        }

        self.store(&doc, self.flush).await?;
        tracing::debug!("Deleted '{}' from '{}'", id, self.namespace);
        Ok(true)
    }

    /// Atomically remove `id` if present, otherwise insert `row`
    ///
    /// Returns the resulting membership. `row` is only consulted when
    /// inserting; its natural id must match `id`.
    pub async fn toggle(&self, id: &str, row: Option<Row>) -> StoreResult<bool> {
        validate_id(id)?;

        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;

        if doc.remove(id) {
            self.store(&doc, FlushMode::Commit).await?;
            return Ok(false);
        }

        let row = row.ok_or_else(|| StoreError::not_found(&self.namespace, id))?;
        match row.natural_id() {
            Some(natural) if same_id(natural, id) => {}
            other => {
                return Err(StoreError::InvalidRow(format!(
                    "row keyed {:?} cannot be stored under '{}'",
                    other, id
                )))
            }
        }

        doc.upsert(id, &row);
        self.store(&doc, FlushMode::Commit).await?;
        Ok(true)
    }

    /// Replace several rows in one write, keyed by each row's natural id
    ///
    /// All-or-nothing: if any id is not indexed nothing is written and
    /// `NotFound` is returned. Returns the number of rows replaced.
    pub async fn update_all(&self, rows: Vec<Row>) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;

        for row in &rows {
            let id = row
                .natural_id()
                .ok_or_else(|| StoreError::InvalidRow("row has no natural id".to_string()))?;
            if !doc.contains(id) {
                return Err(StoreError::not_found(&self.namespace, id));
            }
        }

        for row in &rows {
            if let Some(id) = row.natural_id() {
                doc.upsert(id, row);
            }
        }

        self.store(&doc, FlushMode::Commit).await?;
        tracing::debug!("Replaced {} row(s) in '{}'", rows.len(), self.namespace);
        Ok(rows.len())
    }

    /// Remove every id and row in the namespace, returning how many were removed
    pub async fn bulk_delete(&mut self) -> StoreResult<usize> {
        self.staging = None;

        let _guard = self.locks.acquire(&self.namespace).await;
        let mut doc = self.load().await?;
        let removed = doc.clear();

        self.store(&doc, FlushMode::Commit).await?;
        tracing::info!("Cleared {} row(s) from '{}'", removed, self.namespace);
        Ok(removed)
    }

    async fn load(&self) -> StoreResult<CollectionDocument> {
        let raw = self.substrate.read(&self.namespace, EMPTY_DOCUMENT).await?;
        CollectionDocument::decode(&self.namespace, &raw)
    }

    async fn store(&self, doc: &CollectionDocument, flush: FlushMode) -> StoreResult<()> {
        self.substrate
            .write(&self.namespace, doc.encode(&self.namespace), flush)
            .await
    }
}

fn validate_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidRow("id is empty".to_string()));
    }
    if same_id(id, IDS_FIELD) {
        return Err(StoreError::InvalidRow(format!(
            "'{}' is reserved for the id index",
            IDS_FIELD
        )));
    }
    Ok(())
}
