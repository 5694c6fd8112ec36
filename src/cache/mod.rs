//! Generic offline-first caching layer.
//!
//! This module is catalog-agnostic. It:
//! - Persists entities in one keyed table per kind, upserted by id
//! - Serves collections from the store first and refreshes per kind policy
//! - Trusts cached records for keyed reads
//! - Degrades to cached data (or nothing) when the network fails

mod error;
mod feed;
mod layer;
mod storage;
mod traits;

pub use error::{StorageError, StorageResult};
pub use feed::Feed;
pub use layer::CacheLayer;
pub use storage::{EntityStore, SqliteStorage, StoredEntity, UpsertOutcome, UpsertSummary};
pub use traits::{Entity, KeyField, Lookup, RefreshPolicy, Snapshot, Source};
