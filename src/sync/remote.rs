/// Remote catalog collaborator
///
/// The sync layer only needs workflow listings and single-workflow detail.
/// Transport lives outside this crate; implementations here are the offline
/// stand-in and an in-memory catalog.

use crate::workflow::{Workflow, Workflows};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Query options forwarded verbatim to the catalog (paging, sort, fields)
pub type FetchOptions = HashMap<String, String>;

#[async_trait]
pub trait RemoteCatalog: Send + Sync + std::fmt::Debug {
    async fn fetch_workflows(&self, options: &FetchOptions) -> Result<Workflows>;

    async fn fetch_workflow(&self, id: &str) -> Result<Workflow>;
}

/// Catalog used when no remote is reachable; every fetch fails
#[derive(Debug, Clone, Default)]
pub struct OfflineCatalog;

#[async_trait]
impl RemoteCatalog for OfflineCatalog {
    async fn fetch_workflows(&self, _options: &FetchOptions) -> Result<Workflows> {
        Err(anyhow::anyhow!("remote catalog is offline"))
    }

    async fn fetch_workflow(&self, id: &str) -> Result<Workflow> {
        Err(anyhow::anyhow!("remote catalog is offline, cannot fetch '{}'", id))
    }
}

/// In-memory catalog serving a fixed set of workflows
#[derive(Debug, Default)]
pub struct StaticCatalog {
    workflows: Vec<Workflow>,
}

impl StaticCatalog {
    pub fn new(workflows: Vec<Workflow>) -> Self {
        Self { workflows }
    }
}

#[async_trait]
impl RemoteCatalog for StaticCatalog {
    /// Honours a `page` / `per_page` pair when both are present (1-based pages)
    async fn fetch_workflows(&self, options: &FetchOptions) -> Result<Workflows> {
        let workflows = &self.workflows;

        let page = options.get("page").and_then(|p| p.parse::<usize>().ok());
        let per_page = options.get("per_page").and_then(|p| p.parse::<usize>().ok());

        let selected = match (page, per_page) {
            (Some(page), Some(per_page)) if page > 0 && per_page > 0 => {
                // An offset past usize::MAX is past the end of any listing
                match (page - 1).checked_mul(per_page) {
                    Some(offset) => workflows
                        .iter()
                        .skip(offset)
                        .take(per_page)
                        .cloned()
                        .collect(),
                    None => Vec::new(),
                }
            }
            _ => workflows.clone(),
        };

        Ok(Workflows::from(selected))
    }

    async fn fetch_workflow(&self, id: &str) -> Result<Workflow> {
        self.workflows
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Workflow not found: {}", id))
    }
}
