//! Cache layer that reconciles the local store with network fetches.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::feed::{Feed, FeedSender};
use super::storage::{EntityStore, StoredEntity};
use super::traits::{Entity, Lookup, Snapshot};
use crate::remote::RemoteError;

/// Cache layer that decides, per read, between the store and the network.
///
/// Reads never fail: network errors degrade to whatever the store holds and
/// store errors are logged and skipped.
pub struct CacheLayer<S: EntityStore> {
  storage: Arc<S>,
}

impl<S: EntityStore> CacheLayer<S> {
  /// Create a cache layer over a store shared with other owners.
  pub fn from_shared(storage: Arc<S>) -> Self {
    Self { storage }
  }

  /// Read a collection with cache-then-network semantics.
  ///
  /// 1. Cached records exist: deliver them right away, and refresh in the
  ///    background only if the kind's [`RefreshPolicy`](super::RefreshPolicy)
  ///    asks for it for this `page`
  /// 2. Nothing cached: wait for the network before returning
  /// 3. Network success is written back and delivered as the final value
  /// 4. Network failure re-delivers the store contents for the whole kind
  ///
  /// Cached deliveries are never filtered by page.
  pub async fn fetch_page<T, F, Fut>(&self, page: u32, fetcher: F) -> Feed<Vec<T>>
  where
    T: Entity,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, RemoteError>> + Send + 'static,
  {
    let cached = cached_all::<S, T>(&self.storage);

    if !cached.is_empty() {
      let refresh = T::REFRESH.should_refresh(page, cached.len());
      debug!(kind = T::ENTITY_TYPE, page, count = cached.len(), refresh, "serving cached collection");

      let snapshot = collection_snapshot(cached, Snapshot::from_cache);
      if !refresh {
        return Feed::ready(snapshot);
      }

      let (tx, feed) = Feed::channel(Some(snapshot));
      self.spawn_collection_fetch(tx, page, fetcher);
      return feed;
    }

    debug!(kind = T::ENTITY_TYPE, page, "cache empty, fetching from network");
    let (tx, mut feed) = Feed::channel(None);
    self.spawn_collection_fetch(tx, page, fetcher);
    feed.wait_first().await;
    feed
  }

  /// Read a single record. A cached record is trusted unconditionally; the
  /// network is consulted only on a miss, and a failed fetch yields `None`.
  pub async fn fetch_one<T, F, Fut>(&self, lookup: &Lookup, fetcher: F) -> Option<Snapshot<T>>
  where
    T: Entity,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
  {
    match self.storage.get::<T>(lookup) {
      Ok(Some(cached)) => {
        debug!(kind = T::ENTITY_TYPE, key = %lookup, "cache hit");
        return Some(Snapshot::from_cache(cached.entity, Some(cached.cached_at)));
      }
      Ok(None) => debug!(kind = T::ENTITY_TYPE, key = %lookup, "cache miss"),
      Err(e) => warn!(kind = T::ENTITY_TYPE, key = %lookup, error = %e, "cache read failed"),
    }

    let storage = Arc::clone(&self.storage);
    let key = lookup.to_string();

    // Spawned so the write-back completes even if the caller stops waiting
    let task = tokio::spawn(async move {
      match fetcher().await {
        Ok(entity) => {
          if let Err(e) = storage.upsert(&entity) {
            warn!(kind = T::ENTITY_TYPE, key = %key, error = %e, "failed to cache fetched record");
          }
          Some(Snapshot::from_network(entity))
        }
        Err(e) if e.is_not_found() => {
          debug!(kind = T::ENTITY_TYPE, key = %key, "not found remotely");
          None
        }
        Err(e) => {
          warn!(kind = T::ENTITY_TYPE, key = %key, error = %e, "remote fetch failed");
          None
        }
      }
    });

    match task.await {
      Ok(result) => result,
      Err(e) => {
        warn!(kind = T::ENTITY_TYPE, key = %lookup, error = %e, "fetch task aborted");
        None
      }
    }
  }

  fn spawn_collection_fetch<T, F, Fut>(&self, tx: FeedSender<Vec<T>>, page: u32, fetcher: F)
  where
    T: Entity,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<T>, RemoteError>> + Send + 'static,
  {
    let storage = Arc::clone(&self.storage);

    tokio::spawn(async move {
      let snapshot = match fetcher().await {
        Ok(data) => {
          match storage.upsert_many(&data) {
            Ok(summary) => info!(
              kind = T::ENTITY_TYPE,
              page,
              inserted = summary.inserted,
              replaced = summary.replaced,
              unchanged = summary.unchanged,
              "cached network page"
            ),
            Err(e) => {
              warn!(kind = T::ENTITY_TYPE, page, error = %e, "failed to cache network page")
            }
          }
          Snapshot::from_network(data)
        }
        Err(e) => {
          warn!(kind = T::ENTITY_TYPE, page, error = %e, "remote list failed, serving cache");
          collection_snapshot(cached_all::<S, T>(&storage), Snapshot::offline)
        }
      };

      if !tx.deliver(snapshot) {
        debug!(kind = T::ENTITY_TYPE, page, "consumer gone, delivery dropped");
      }
    });
  }
}

impl<S: EntityStore> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

/// Store contents for a kind; a failing store reads as empty.
fn cached_all<S: EntityStore, T: Entity>(storage: &S) -> Vec<StoredEntity<T>> {
  storage.get_all::<T>().unwrap_or_else(|e| {
    warn!(kind = T::ENTITY_TYPE, error = %e, "cache read failed");
    Vec::new()
  })
}

fn collection_snapshot<T>(
  cached: Vec<StoredEntity<T>>,
  build: fn(Vec<T>, Option<DateTime<Utc>>) -> Snapshot<Vec<T>>,
) -> Snapshot<Vec<T>> {
  let oldest = cached.iter().map(|c| c.cached_at).min();
  build(cached.into_iter().map(|c| c.entity).collect(), oldest)
}
