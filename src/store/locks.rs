/// Per-namespace write locks
///
/// Every read-modify-write of a namespace slot runs while holding that
/// namespace's mutex. Locks are created lazily and shared by every
/// `DocumentStore` opened from the same `LocalStore`.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Debug, Default)]
pub struct NamespaceLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held for the duration of one read-modify-write cycle
pub type NamespaceGuard = OwnedMutexGuard<()>;

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock for `namespace`, creating it on first use
    pub async fn acquire(&self, namespace: &str) -> NamespaceGuard {
        self.lock_for(namespace).await.lock_owned().await
    }

    async fn lock_for(&self, namespace: &str) -> Arc<Mutex<()>> {
        // Read lock first (fast path for known namespaces)
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(namespace) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().await;
        Arc::clone(
            locks
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Number of namespaces that have been locked at least once
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }
}
