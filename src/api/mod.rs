/// HTTP API layer
///
/// Presentation boundary for the favorites store: listing, detail,
/// membership checks, toggling and listing sync.

pub mod favorites;

pub use favorites::{create_favorite_routes, AppState};
