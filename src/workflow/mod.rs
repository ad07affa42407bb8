/// Workflow model layer
///
/// Remote workflow records and the typed row schema used to keep favorites
/// in the local store.

pub mod types;

pub use types::{FavoriteWorkflow, RowSchema, Workflow, Workflows};
