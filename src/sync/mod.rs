/// Sync/merge layer
///
/// Reconciles remote workflow listings with the local favorites namespace:
/// - `FavoritesService`: list / check / toggle favorites and annotate listings
/// - `RemoteCatalog`: the remote fetch collaborator
/// - `Pending` / `ViewState`: background execution and presentation outcomes

pub mod pending;
pub mod remote;
pub mod service;

pub use pending::{Pending, ViewState};
pub use remote::{FetchOptions, OfflineCatalog, RemoteCatalog, StaticCatalog};
pub use service::{FavoritesService, FAVORITES_NAMESPACE};
