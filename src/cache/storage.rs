//! Entity store trait and SQLite implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::traits::{Entity, Lookup};

/// A single cached entity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntity<T> {
  /// The cached entity
  pub entity: T,
  /// When the entity was last written or confirmed by the network
  pub cached_at: DateTime<Utc>,
}

/// What a single upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted,
  Replaced,
  /// Stored record was byte-identical; only `cached_at` was touched.
  Unchanged,
}

/// Per-outcome counts for a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
  pub inserted: usize,
  pub replaced: usize,
  pub unchanged: usize,
}

impl UpsertSummary {
  fn record(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Inserted => self.inserted += 1,
      UpsertOutcome::Replaced => self.replaced += 1,
      UpsertOutcome::Unchanged => self.unchanged += 1,
    }
  }

  pub fn total(&self) -> usize {
    self.inserted + self.replaced + self.unchanged
  }
}

/// Trait for entity store backends.
///
/// One keyed table per entity kind. Upserts replace whole records by id;
/// nothing is ever deleted.
pub trait EntityStore: Send + Sync + 'static {
  /// All cached records of a kind, in first-insertion order.
  fn get_all<T: Entity>(&self) -> StorageResult<Vec<StoredEntity<T>>>;

  /// A single record by id or slug.
  fn get<T: Entity>(&self, lookup: &Lookup) -> StorageResult<Option<StoredEntity<T>>>;

  /// Insert or replace a record by id. A record takes its slug from any
  /// other record that held it.
  fn upsert<T: Entity>(&self, entity: &T) -> StorageResult<UpsertOutcome>;

  /// Insert or replace a batch of records by id, all or nothing. Fails
  /// without writing when two records in the batch claim one slug.
  fn upsert_many<T: Entity>(&self, entities: &[T]) -> StorageResult<UpsertSummary>;

  /// Number of cached records of a kind.
  fn count<T: Entity>(&self) -> StorageResult<usize>;
}

/// SQLite-based entity store.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the store at the default location.
  pub fn open() -> StorageResult<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the store at `path`.
  pub fn open_at(path: &Path) -> StorageResult<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    Self::from_connection(Connection::open(path)?)
  }

  /// Open a private in-memory store. Contents vanish when it is dropped.
  pub fn open_in_memory() -> StorageResult<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> StorageResult<Self> {
    conn.execute_batch(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StorageError::NoDataDir)?;

    Ok(data_dir.join("petcare").join("cache.db"))
  }

  fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|_| StorageError::LockPoisoned)
  }
}

/// Schema for the entity cache.
///
/// `seq` keeps first-insertion order: the upsert below updates rows in
/// place, so a replaced record keeps its position.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entity_cache (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    slug TEXT,
    data BLOB NOT NULL,
    content_hash TEXT NOT NULL,
    updated_at TEXT,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (entity_type, entity_id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_entity_cache_slug
    ON entity_cache(entity_type, slug) WHERE slug IS NOT NULL;
"#;

impl EntityStore for SqliteStorage {
  fn get_all<T: Entity>(&self) -> StorageResult<Vec<StoredEntity<T>>> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare(
      "SELECT entity_id, data, cached_at FROM entity_cache
       WHERE entity_type = ?
       ORDER BY seq",
    )?;

    let rows = stmt
      .query_map(params![T::ENTITY_TYPE], |row| {
        Ok((
          row.get::<_, String>(0)?,
          row.get::<_, Vec<u8>>(1)?,
          row.get::<_, String>(2)?,
        ))
      })?
      .collect::<Result<Vec<_>, _>>()?;

    let mut entities = Vec::with_capacity(rows.len());
    for (id, data, cached_at) in rows {
      // A row that no longer decodes is skipped rather than failing the whole kind
      match decode_row::<T>(&data, &cached_at) {
        Ok(stored) => entities.push(stored),
        Err(e) => warn!(kind = T::ENTITY_TYPE, id = %id, error = %e, "skipping undecodable cache row"),
      }
    }

    Ok(entities)
  }

  fn get<T: Entity>(&self, lookup: &Lookup) -> StorageResult<Option<StoredEntity<T>>> {
    let conn = self.lock()?;

    let sql = match lookup {
      Lookup::Id(_) => {
        "SELECT data, cached_at FROM entity_cache WHERE entity_type = ? AND entity_id = ?"
      }
      Lookup::Slug(_) => {
        "SELECT data, cached_at FROM entity_cache WHERE entity_type = ? AND slug = ?"
      }
    };

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(sql, params![T::ENTITY_TYPE, lookup.value()], |row| {
        Ok((row.get(0)?, row.get(1)?))
      })
      .optional()?;

    match row {
      Some((data, cached_at)) => match decode_row::<T>(&data, &cached_at) {
        Ok(stored) => Ok(Some(stored)),
        Err(e) => {
          warn!(kind = T::ENTITY_TYPE, key = %lookup, error = %e, "treating undecodable cache row as a miss");
          Ok(None)
        }
      },
      None => Ok(None),
    }
  }

  fn upsert<T: Entity>(&self, entity: &T) -> StorageResult<UpsertOutcome> {
    let conn = self.lock()?;
    upsert_row(&conn, entity)
  }

  fn upsert_many<T: Entity>(&self, entities: &[T]) -> StorageResult<UpsertSummary> {
    check_batch_slugs(entities)?;

    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    let mut summary = UpsertSummary::default();
    for entity in entities {
      summary.record(upsert_row(&tx, entity)?);
    }

    tx.commit()?;
    Ok(summary)
  }

  fn count<T: Entity>(&self) -> StorageResult<usize> {
    let conn = self.lock()?;
    let count: i64 = conn.query_row(
      "SELECT COUNT(*) FROM entity_cache WHERE entity_type = ?",
      params![T::ENTITY_TYPE],
      |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

fn upsert_row<T: Entity>(conn: &Connection, entity: &T) -> StorageResult<UpsertOutcome> {
  let entity_type = T::ENTITY_TYPE;
  let id = entity.id();
  let data = serde_json::to_vec(entity).map_err(|source| StorageError::Serialize {
    entity_type,
    id: id.to_string(),
    source,
  })?;
  let hash = content_hash(&data);
  let slug = entity.slug().filter(|s| !s.is_empty());

  let existing: Option<(String, Option<String>)> = conn
    .query_row(
      "SELECT content_hash, slug FROM entity_cache WHERE entity_type = ? AND entity_id = ?",
      params![entity_type, id],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;

  // Same content still needs a full write if another record took the slug meanwhile
  if let Some((stored_hash, stored_slug)) = &existing {
    if *stored_hash == hash && stored_slug.as_deref() == slug {
      conn.execute(
        "UPDATE entity_cache SET cached_at = datetime('now')
         WHERE entity_type = ? AND entity_id = ?",
        params![entity_type, id],
      )?;
      return Ok(UpsertOutcome::Unchanged);
    }
  }

  // The incoming record wins its slug; a previous holder keeps its row without one
  if let Some(slug) = slug {
    let released = conn.execute(
      "UPDATE entity_cache SET slug = NULL
       WHERE entity_type = ? AND slug = ? AND entity_id <> ?",
      params![entity_type, slug, id],
    )?;
    if released > 0 {
      debug!(kind = entity_type, id = %id, slug = %slug, "slug moved to another record");
    }
  }

  conn.execute(
    "INSERT INTO entity_cache (entity_type, entity_id, slug, data, content_hash, updated_at, cached_at)
     VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
     ON CONFLICT (entity_type, entity_id) DO UPDATE SET
       slug = excluded.slug,
       data = excluded.data,
       content_hash = excluded.content_hash,
       updated_at = excluded.updated_at,
       cached_at = excluded.cached_at",
    params![entity_type, id, slug, data, hash, entity.updated_at()],
  )?;

  Ok(if existing.is_some() {
    UpsertOutcome::Replaced
  } else {
    UpsertOutcome::Inserted
  })
}

/// Reject a batch in which two different records claim the same slug.
fn check_batch_slugs<T: Entity>(entities: &[T]) -> StorageResult<()> {
  let mut owners: HashMap<&str, &str> = HashMap::new();
  for entity in entities {
    let Some(slug) = entity.slug().filter(|s| !s.is_empty()) else {
      continue;
    };
    match owners.insert(slug, entity.id()) {
      Some(other) if other != entity.id() => {
        return Err(StorageError::SlugConflict {
          entity_type: T::ENTITY_TYPE,
          id: entity.id().to_string(),
          slug: slug.to_string(),
          existing: other.to_string(),
        });
      }
      _ => {}
    }
  }
  Ok(())
}

fn decode_row<T: Entity>(data: &[u8], cached_at: &str) -> Result<StoredEntity<T>, String> {
  let entity = serde_json::from_slice(data).map_err(|e| e.to_string())?;
  let cached_at = parse_datetime(cached_at).map_err(|e| e.to_string())?;
  Ok(StoredEntity { entity, cached_at })
}

/// SHA256 of the serialized record, hex encoded.
fn content_hash(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> StorageResult<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|_| StorageError::Timestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_sqlite_timestamps() {
    let parsed = parse_datetime("2025-08-14 18:58:03").unwrap();
    assert_eq!(parsed.to_rfc3339(), "2025-08-14T18:58:03+00:00");
    assert!(parse_datetime("yesterday").is_err());
  }

  #[test]
  fn content_hash_is_stable() {
    assert_eq!(content_hash(b"{}"), content_hash(b"{}"));
    assert_ne!(content_hash(b"{}"), content_hash(b"[]"));
    assert_eq!(content_hash(b"").len(), 64);
  }

  #[test]
  fn summary_totals() {
    let mut summary = UpsertSummary::default();
    summary.record(UpsertOutcome::Inserted);
    summary.record(UpsertOutcome::Unchanged);
    summary.record(UpsertOutcome::Unchanged);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.unchanged, 2);
  }
}
