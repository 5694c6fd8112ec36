//! Core traits and types for the caching system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Field a keyed read is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
  Id,
  Slug,
}

/// How a non-empty cached collection is refreshed from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
  /// Refresh in the background when the caller pages past the first page.
  BeyondFirstPage,
  /// A populated cache is trusted for every page.
  PreferCache,
}

impl RefreshPolicy {
  /// Whether a collection read for `page` should also hit the network,
  /// given how many records are cached for the kind.
  pub fn should_refresh(self, page: u32, cached_len: usize) -> bool {
    if cached_len == 0 {
      return true;
    }
    match self {
      Self::BeyondFirstPage => page > 1,
      Self::PreferCache => false,
    }
  }
}

/// Trait for entities that can be cached.
///
/// This is the per-kind descriptor the cache layer is generic over: where the
/// records live locally, how they are addressed remotely, and which refresh
/// rule applies to their collections.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Entity type name for storage organization (e.g., "animal", "breed")
  const ENTITY_TYPE: &'static str;

  /// Remote collection path segment (e.g., "animals")
  const ENDPOINT: &'static str;

  /// Key used by keyed reads.
  const NATURAL_KEY: KeyField = KeyField::Id;

  const REFRESH: RefreshPolicy = RefreshPolicy::PreferCache;

  /// Primary key, unique per kind.
  fn id(&self) -> &str;

  /// Alternate human-readable key, if this kind has one and it is set.
  fn slug(&self) -> Option<&str> {
    None
  }

  /// Last modification timestamp (ISO 8601), if tracked.
  fn updated_at(&self) -> Option<&str> {
    None
  }
}

/// Address of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
  Id(String),
  Slug(String),
}

impl Lookup {
  /// Build a lookup on the natural key of `T`.
  pub fn natural<T: Entity>(key: impl Into<String>) -> Self {
    match T::NATURAL_KEY {
      KeyField::Id => Self::Id(key.into()),
      KeyField::Slug => Self::Slug(key.into()),
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Self::Id(v) | Self::Slug(v) => v,
    }
  }

  /// Whether `entity` is the record this lookup addresses.
  pub fn matches<T: Entity>(&self, entity: &T) -> bool {
    match self {
      Self::Id(id) => entity.id() == id,
      Self::Slug(slug) => entity.slug() == Some(slug.as_str()),
    }
  }
}

impl fmt::Display for Lookup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Id(id) => write!(f, "id={}", id),
      Self::Slug(slug) => write!(f, "slug={}", slug),
    }
  }
}

/// One delivery of a read, including data and metadata about the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
  /// Where the data came from
  pub source: Source,
  /// When the data was cached (oldest write, for collections)
  pub cached_at: Option<DateTime<Utc>>,
  /// The actual data
  pub data: T,
}

impl<T> Snapshot<T> {
  /// Fresh data from the network.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: Source::Network,
      cached_at: None,
    }
  }

  /// Data served from the store without contacting the network.
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: Source::Cache,
      cached_at,
    }
  }

  /// Network failed, serving whatever the store holds.
  pub fn offline(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: Source::Offline,
      cached_at,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Snapshot<U> {
    Snapshot {
      data: f(self.data),
      source: self.source,
      cached_at: self.cached_at,
    }
  }
}

/// Indicates where delivered data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// Fresh data from network
  Network,
  /// Data from the local store, network not consulted (yet)
  Cache,
  /// Network unavailable or failing, serving cached data
  Offline,
}
