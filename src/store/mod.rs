/// Local document store
///
/// JSON collection documents kept one-per-namespace in a flat key-value
/// substrate, with an ordered id index, keyed CRUD and staged batch writes.

pub mod document;
pub mod engine;
pub mod error;
pub mod id;
pub mod locks;
pub mod sqlite;
pub mod substrate;

pub use document::{CollectionDocument, Row};
pub use engine::{DocumentStore, InsertOutcome, LocalStore};
pub use error::{RowDecodeError, StoreError, StoreResult};
pub use sqlite::SqliteSubstrate;
pub use substrate::{FlushMode, MemorySubstrate, Substrate};
