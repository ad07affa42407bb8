/// Error types for the document store.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted collection document could not be decoded.
    #[error("namespace '{namespace}' holds an undecodable document: {reason}")]
    Decode { namespace: String, reason: String },

    #[error("no row with id '{id}' in namespace '{namespace}'")]
    NotFound { namespace: String, id: String },

    #[error("save called on namespace '{namespace}' with nothing staged")]
    StagingNotInitialized { namespace: String },

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("substrate failure: {0}")]
    Substrate(String),

    #[error("background task failed: {0}")]
    Background(String),
}

impl StoreError {
    pub(crate) fn decode(namespace: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            namespace: namespace.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(namespace: &str, id: &str) -> Self {
        Self::NotFound {
            namespace: namespace.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Substrate(err.to_string())
    }
}

/// A single row that could not be decoded during a bulk read.
///
/// Never escapes a bulk read; it is logged and the row skipped.
#[derive(Debug, Error)]
#[error("row '{id}' is malformed: {reason}")]
pub struct RowDecodeError {
    pub id: String,
    pub reason: String,
}
