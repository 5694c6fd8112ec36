//! Local persistence errors.

use std::path::PathBuf;

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to serialize {entity_type} {id}: {source}")]
  Serialize {
    entity_type: &'static str,
    id: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("cache lock poisoned")]
  LockPoisoned,

  #[error("{entity_type} batch gives slug {slug:?} to both {existing} and {id}")]
  SlugConflict {
    entity_type: &'static str,
    id: String,
    slug: String,
    existing: String,
  },

  #[error("failed to parse cached timestamp {0:?}")]
  Timestamp(String),

  #[error("failed to create cache directory {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("could not determine data directory")]
  NoDataDir,
}
