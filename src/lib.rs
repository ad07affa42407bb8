/// Workflow favorites: offline favorites store for a scientific workflow catalog
///
/// Keeps favorite workflows in JSON collection documents on a flat key-value
/// substrate and merges them with listings fetched from the remote catalog.

// Core configuration and setup
pub mod config;

// Local document store - namespaced collection documents over a key-value substrate
pub mod store;

// Workflow records and the favorite row schema
pub mod workflow;

// Sync/merge layer - favorite flags on remote listings, toggles, background handles
pub mod sync;

// HTTP API layer - presentation boundary for favorites
pub mod api;

// Server setup and initialization
pub mod server;

pub use server::start_server;
pub use store::{DocumentStore, InsertOutcome, LocalStore, Row, StoreError};
pub use sync::{FavoritesService, Pending, ViewState};
pub use workflow::{FavoriteWorkflow, Workflow, Workflows};
