/// Persistent key-value substrate
///
/// The document store keeps one string value per namespace in a substrate.
/// Writes replace the whole value; readers always observe the latest write
/// made by this process, whichever flush mode was used.

use crate::store::error::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};
use tokio::sync::RwLock;

/// When a write is considered finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// Return once the value is durable
    #[default]
    Commit,
    /// Return once the value is visible to readers; durability follows in the background
    Apply,
}

impl FromStr for FlushMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit" => Ok(Self::Commit),
            "apply" => Ok(Self::Apply),
            other => Err(format!("unknown flush mode '{}'", other)),
        }
    }
}

/// String-keyed, string-valued persistent map
#[async_trait]
pub trait Substrate: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, or `default` if the slot is empty
    async fn read(&self, key: &str, default: &str) -> StoreResult<String>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, value: String, flush: FlushMode) -> StoreResult<()>;
}

/// In-process substrate. Both flush modes are immediate.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw slot contents, bypassing the document codec
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.slots.read().await.get(key).cloned()
    }
}

#[async_trait]
impl Substrate for MemorySubstrate {
    async fn read(&self, key: &str, default: &str) -> StoreResult<String> {
        Ok(self
            .slots
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn write(&self, key: &str, value: String, _flush: FlushMode) -> StoreResult<()> {
        self.slots.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
