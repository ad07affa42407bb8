/// SQLite-backed substrate
///
/// Stores each namespace as one row of a `preferences` table. All writes go
/// through a single background writer so that deferred (`Apply`) writes reach
/// disk in the order they were issued. An in-memory cache in front of the
/// table gives readers their own writes before the writer catches up.
/// Committed writes only reach the cache once the database accepted them.

use crate::store::{
    error::{StoreError, StoreResult},
    substrate::{FlushMode, Substrate},
};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Row,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::sync::{mpsc, oneshot, RwLock};

enum WriteRequest {
    Put {
        key: String,
        value: String,
        ack: Option<oneshot::Sender<StoreResult<()>>>,
    },
    Barrier(oneshot::Sender<()>),
}

/// Preference-table substrate with ordered background writes
#[derive(Debug, Clone)]
pub struct SqliteSubstrate {
    pool: SqlitePool,
    /// Latest value per key written or read by this process
    cache: Arc<RwLock<HashMap<String, String>>>,
    writer: mpsc::UnboundedSender<WriteRequest>,
}

impl SqliteSubstrate {
    /// Open (or create) the preference database at `path`
    ///
    /// Must be called inside a tokio runtime; the writer task is spawned here.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Substrate(format!(
                    "failed to create data directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tracing::info!("🗄️ Opening preference database: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Build a substrate over an existing pool, creating the schema if needed
    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        init_schema(&pool).await?;

        let (writer, requests) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(pool.clone(), requests));

        Ok(Self {
            pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
            writer,
        })
    }

    /// Wait until every write issued so far has reached the database
    pub async fn flush(&self) -> StoreResult<()> {
        let (tx, rx) = oneshot::channel();
        self.writer
            .send(WriteRequest::Barrier(tx))
            .map_err(|_| writer_gone())?;
        rx.await.map_err(|_| writer_gone())
    }

    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }
}

#[async_trait]
impl Substrate for SqliteSubstrate {
    async fn read(&self, key: &str, default: &str) -> StoreResult<String> {
        if let Some(value) = self.cache.read().await.get(key) {
            return Ok(value.clone());
        }

        match self.load(key).await? {
            Some(value) => {
                // A write racing this load already holds the newer value
                let mut cache = self.cache.write().await;
                Ok(cache.entry(key.to_string()).or_insert(value).clone())
            }
            None => Ok(default.to_string()),
        }
    }

    async fn write(&self, key: &str, value: String, flush: FlushMode) -> StoreResult<()> {
        // Cache update and enqueue happen under one guard so queue order matches cache order
        let mut cache = self.cache.write().await;

        match flush {
            FlushMode::Apply => {
                cache.insert(key.to_string(), value.clone());
                self.writer
                    .send(WriteRequest::Put {
                        key: key.to_string(),
                        value,
                        ack: None,
                    })
                    .map_err(|_| writer_gone())
            }
            FlushMode::Commit => {
                let (tx, rx) = oneshot::channel();
                self.writer
                    .send(WriteRequest::Put {
                        key: key.to_string(),
                        value: value.clone(),
                        ack: Some(tx),
                    })
                    .map_err(|_| writer_gone())?;

                // A failed commit leaves the cached value untouched
                rx.await.map_err(|_| writer_gone())??;
                cache.insert(key.to_string(), value);
                Ok(())
            }
        }
    }
}

async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn upsert(pool: &SqlitePool, key: &str, value: &str) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO preferences (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

async fn run_writer(pool: SqlitePool, mut requests: mpsc::UnboundedReceiver<WriteRequest>) {
    while let Some(request) = requests.recv().await {
        match request {
            WriteRequest::Put { key, value, ack } => {
                let result = upsert(&pool, &key, &value).await;
                match ack {
                    Some(ack) => {
                        let _ = ack.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            tracing::error!("❌ Deferred write of '{}' failed: {}", key, e);
                        }
                    }
                }
            }
            WriteRequest::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Preference writer stopped");
}

fn writer_gone() -> StoreError {
    StoreError::Substrate("preference writer is no longer running".to_string())
}
