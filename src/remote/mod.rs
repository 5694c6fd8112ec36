//! Remote catalog sources.
//!
//! The cache layer only ever sees the [`RemoteSource`] capability; the
//! concrete transport lives in [`http`], and [`memory`] provides a scripted
//! stand-in for tests and offline demos.

pub mod http;
pub mod memory;

use std::future::Future;

use thiserror::Error;

use crate::cache::{Entity, Lookup};

pub use http::HttpRemote;
pub use memory::{Failure, MemoryRemote};

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
  /// Transport-level failure: timeout, connection refused, broken body.
  #[error("network error: {0}")]
  Network(String),

  /// The remote answered with a failure status.
  #[error("server responded with status {status}")]
  Server { status: u16 },

  /// The remote has no such record.
  #[error("{entity_type} {key} not found")]
  NotFound {
    entity_type: &'static str,
    key: String,
  },

  /// The remote answered 2xx with a body we cannot read.
  #[error("failed to decode response: {0}")]
  Decode(String),

  #[error("invalid remote configuration: {0}")]
  Setup(String),
}

impl RemoteError {
  pub fn not_found<T: Entity>(lookup: &Lookup) -> Self {
    Self::NotFound {
      entity_type: T::ENTITY_TYPE,
      key: lookup.to_string(),
    }
  }

  /// Expected misses are logged quieter than real failures.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. })
  }
}

/// Capability to fetch catalog records from somewhere other than the local store.
pub trait RemoteSource: Send + Sync + 'static {
  /// One page of records. `page` is 1-based and passed through unmodified.
  fn list<T: Entity>(
    &self,
    page: u32,
    page_size: u32,
  ) -> impl Future<Output = Result<Vec<T>, RemoteError>> + Send;

  /// A single record by id or slug.
  fn get<T: Entity>(&self, lookup: &Lookup) -> impl Future<Output = Result<T, RemoteError>> + Send;
}
