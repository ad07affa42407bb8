/// Workflow type definitions
///
/// `Workflow` is the record served by the remote catalog; `FavoriteWorkflow`
/// is the typed row schema used to persist a favorite for offline access.

use crate::store::{Row, StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// A workflow as listed by the remote catalog
///
/// `favorite` is never sent by the remote; it is filled in locally when the
/// record is merged with the favorites store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Catalog identifier (e.g., "wf-123")
    pub id: String,
    /// Human-readable title
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Display name of the uploader
    #[serde(default)]
    pub uploader: String,
    /// Where the workflow definition can be downloaded from
    #[serde(default)]
    pub content_uri: String,
    /// Last modification time as reported by the catalog
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub favorite: bool,
}

impl Workflow {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            uploader: String::new(),
            content_uri: String::new(),
            updated_at: String::new(),
            favorite: false,
        }
    }
}

/// One page of workflows from the remote catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflows {
    pub workflows: Vec<Workflow>,
}

impl From<Vec<Workflow>> for Workflows {
    fn from(workflows: Vec<Workflow>) -> Self {
        Self { workflows }
    }
}

/// Entities that can be stored as a row in a collection document
pub trait RowSchema: Sized {
    /// Column names, natural id first
    const COLUMNS: &'static [&'static str];

    fn to_row(&self) -> Row;

    fn from_row(row: &Row) -> StoreResult<Self>;
}

/// A favorite workflow as kept in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteWorkflow {
    pub workflow: Workflow,
    /// RFC 3339 time the workflow was marked favorite
    pub favorited_at: String,
    /// True when the stored row lacked some columns
    #[serde(skip)]
    pub partial: bool,
}

impl FavoriteWorkflow {
    /// Snapshot `workflow` as a favorite marked now
    pub fn from_workflow(workflow: &Workflow) -> Self {
        Self::with_timestamp(workflow, chrono::Utc::now().to_rfc3339())
    }

    pub fn with_timestamp(workflow: &Workflow, favorited_at: String) -> Self {
        Self {
            workflow: Workflow {
                favorite: true,
                ..workflow.clone()
            },
            favorited_at,
            partial: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.workflow.id
    }
}

impl RowSchema for FavoriteWorkflow {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "uploader",
        "content_uri",
        "updated_at",
        "favorited_at",
    ];

    fn to_row(&self) -> Row {
        let w = &self.workflow;
        Row::new(vec![
            w.id.clone(),
            w.title.clone(),
            w.description.clone(),
            w.uploader.clone(),
            w.content_uri.clone(),
            w.updated_at.clone(),
            self.favorited_at.clone(),
        ])
    }

    /// Decode a stored row; only `id` and `title` are required
    ///
    /// Trailing values beyond the known columns (such as the id appended by
    /// bulk reads) are ignored.
    fn from_row(row: &Row) -> StoreResult<Self> {
        let column = |index: usize| row.get(index).unwrap_or_default().to_string();

        let id = column(0);
        if id.is_empty() {
            return Err(StoreError::InvalidRow("favorite row has no id".to_string()));
        }
        let title = row
            .get(1)
            .ok_or_else(|| StoreError::InvalidRow(format!("favorite row '{}' has no title", id)))?
            .to_string();

        Ok(Self {
            workflow: Workflow {
                id,
                title,
                description: column(2),
                uploader: column(3),
                content_uri: column(4),
                updated_at: column(5),
                favorite: true,
            },
            favorited_at: column(6),
            partial: row.len() < Self::COLUMNS.len(),
        })
    }
}
