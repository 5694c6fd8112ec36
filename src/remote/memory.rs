//! In-memory remote source with scripted responses.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{RemoteError, RemoteSource};
use crate::cache::{Entity, Lookup};

/// How a scripted kind fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
  Network,
  Server(u16),
}

impl Failure {
  fn to_error(self) -> RemoteError {
    match self {
      Self::Network => RemoteError::Network("connection refused".to_string()),
      Self::Server(status) => RemoteError::Server { status },
    }
  }
}

/// A recorded `list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
  pub entity_type: &'static str,
  pub page: u32,
  pub page_size: u32,
}

enum Script {
  Records(Box<dyn Any + Send + Sync>),
  Fail(Failure),
}

/// Remote source backed by per-kind record sets that can be swapped or
/// made to fail at any time. Kinds without a script answer with empty pages
/// and `NotFound`.
#[derive(Default)]
pub struct MemoryRemote {
  scripts: Mutex<HashMap<&'static str, Script>>,
  list_requests: Mutex<Vec<ListRequest>>,
  list_calls: AtomicUsize,
  get_calls: AtomicUsize,
}

impl MemoryRemote {
  pub fn new() -> Self {
    Self::default()
  }

  /// Serve `records` for `T`, paged in the given order.
  pub fn set_records<T: Entity>(&self, records: Vec<T>) {
    self.script(T::ENTITY_TYPE, Script::Records(Box::new(records)));
  }

  /// Make every call for `T` fail.
  pub fn fail<T: Entity>(&self, failure: Failure) {
    self.script(T::ENTITY_TYPE, Script::Fail(failure));
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn get_calls(&self) -> usize {
    self.get_calls.load(Ordering::SeqCst)
  }

  pub fn calls(&self) -> usize {
    self.list_calls() + self.get_calls()
  }

  pub fn list_requests(&self) -> Vec<ListRequest> {
    self
      .list_requests
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn script(&self, entity_type: &'static str, script: Script) {
    self
      .scripts
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(entity_type, script);
  }

  fn records<T: Entity>(&self) -> Result<Vec<T>, RemoteError> {
    let scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
    match scripts.get(T::ENTITY_TYPE) {
      Some(Script::Records(records)) => Ok(
        records
          .downcast_ref::<Vec<T>>()
          .cloned()
          .unwrap_or_default(),
      ),
      Some(Script::Fail(failure)) => Err(failure.to_error()),
      None => Ok(Vec::new()),
    }
  }
}

impl RemoteSource for MemoryRemote {
  async fn list<T: Entity>(&self, page: u32, page_size: u32) -> Result<Vec<T>, RemoteError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    self
      .list_requests
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(ListRequest {
        entity_type: T::ENTITY_TYPE,
        page,
        page_size,
      });

    let skip = (page.saturating_sub(1) as usize).saturating_mul(page_size as usize);
    Ok(
      self
        .records::<T>()?
        .into_iter()
        .skip(skip)
        .take(page_size as usize)
        .collect(),
    )
  }

  async fn get<T: Entity>(&self, lookup: &Lookup) -> Result<T, RemoteError> {
    self.get_calls.fetch_add(1, Ordering::SeqCst);
    self
      .records::<T>()?
      .into_iter()
      .find(|entity| lookup.matches(entity))
      .ok_or_else(|| RemoteError::not_found::<T>(lookup))
  }
}
