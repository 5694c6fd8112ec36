//! The catalog repository: single entry point for catalog reads.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::cache::{CacheLayer, Entity, EntityStore, Feed, Lookup};
use crate::remote::RemoteSource;

use super::detail::{age_parts, AnimalDetail, ShelterDetail};
use super::types::{Animal, Breed, Shelter, Species, User};

/// Catalog repository with transparent offline caching.
///
/// Every read returns data or an explicit absence: network and storage
/// failures are logged and absorbed here, never surfaced to the caller.
pub struct Repository<S: EntityStore, R: RemoteSource> {
  cache: CacheLayer<S>,
  remote: Arc<R>,
}

impl<S: EntityStore, R: RemoteSource> Repository<S, R> {
  pub fn new(storage: S, remote: R) -> Self {
    Self::from_shared(Arc::new(storage), Arc::new(remote))
  }

  /// Build over a store and remote that are also held elsewhere.
  pub fn from_shared(storage: Arc<S>, remote: Arc<R>) -> Self {
    Self {
      cache: CacheLayer::from_shared(storage),
      remote,
    }
  }

  /// One page of a kind. The first delivery may come from the store and
  /// be superseded by a network refresh.
  ///
  /// Cached deliveries hold every cached record of the kind, whatever the
  /// page. `page` and `page_size` below 1 are raised to 1.
  pub async fn get_page<T: Entity>(&self, page: u32, page_size: u32) -> Feed<Vec<T>> {
    let (page, page_size) = normalize_paging(page, page_size);
    debug!(kind = T::ENTITY_TYPE, page, page_size, "collection read");

    let remote = Arc::clone(&self.remote);
    self
      .cache
      .fetch_page(page, move || async move {
        remote.list::<T>(page, page_size).await
      })
      .await
  }

  /// A single record by the kind's natural key (slug for animals and
  /// shelters, id otherwise).
  pub async fn get_by_key<T: Entity>(&self, key: &str) -> Option<T> {
    self.get_by::<T>(Lookup::natural::<T>(key)).await
  }

  /// A single record by id, whatever the kind's natural key.
  pub async fn get_by_id<T: Entity>(&self, id: &str) -> Option<T> {
    self.get_by::<T>(Lookup::Id(id.to_string())).await
  }

  async fn get_by<T: Entity>(&self, lookup: Lookup) -> Option<T> {
    let remote = Arc::clone(&self.remote);
    let remote_lookup = lookup.clone();

    self
      .cache
      .fetch_one(&lookup, move || async move {
        remote.get::<T>(&remote_lookup).await
      })
      .await
      .map(|snapshot| snapshot.data)
  }

  /// Resolve an optional weak reference by id.
  async fn resolve<T: Entity>(&self, id: Option<&str>) -> Option<T> {
    match id.filter(|id| !id.is_empty()) {
      Some(id) => self.get_by_id::<T>(id).await,
      None => None,
    }
  }

  pub async fn animals(&self, page: u32, page_size: u32) -> Feed<Vec<Animal>> {
    self.get_page(page, page_size).await
  }

  pub async fn animal(&self, slug: &str) -> Option<Animal> {
    self.get_by_key(slug).await
  }

  pub async fn shelters(&self, page: u32, page_size: u32) -> Feed<Vec<Shelter>> {
    self.get_page(page, page_size).await
  }

  pub async fn shelter(&self, slug: &str) -> Option<Shelter> {
    self.get_by_key(slug).await
  }

  pub async fn species_list(&self, page: u32, page_size: u32) -> Feed<Vec<Species>> {
    self.get_page(page, page_size).await
  }

  pub async fn species(&self, id: &str) -> Option<Species> {
    self.get_by_key(id).await
  }

  pub async fn breeds(&self, page: u32, page_size: u32) -> Feed<Vec<Breed>> {
    self.get_page(page, page_size).await
  }

  pub async fn breed(&self, id: &str) -> Option<Breed> {
    self.get_by_key(id).await
  }

  pub async fn users(&self, page: u32, page_size: u32) -> Feed<Vec<User>> {
    self.get_page(page, page_size).await
  }

  pub async fn user(&self, id: &str) -> Option<User> {
    self.get_by_key(id).await
  }

  /// An animal by slug with its breed, species, shelter and owner resolved.
  ///
  /// References are looked up cache-first like any keyed read; the species is
  /// reached through the breed. Unresolvable references come back as `None`.
  pub async fn animal_detail(&self, slug: &str) -> Option<AnimalDetail> {
    let animal = self.animal(slug).await?;

    let (breed, shelter, user) = tokio::join!(
      self.resolve::<Breed>(animal.breed_id.as_deref()),
      self.resolve::<Shelter>(animal.shelter_id.as_deref()),
      self.resolve::<User>(animal.user_id.as_deref()),
    );
    let species = self
      .resolve::<Species>(breed.as_ref().map(|b| b.species_id.as_str()))
      .await;
    let age = age_parts(animal.birthday.as_deref(), Utc::now().date_naive());

    Some(AnimalDetail {
      animal,
      breed,
      species,
      shelter,
      user,
      age,
    })
  }

  /// A shelter by slug with its manager resolved.
  pub async fn shelter_detail(&self, slug: &str) -> Option<ShelterDetail> {
    let shelter = self.shelter(slug).await?;
    let manager = self.resolve::<User>(shelter.manager_id.as_deref()).await;
    Some(ShelterDetail { shelter, manager })
  }
}

impl<S: EntityStore, R: RemoteSource> Clone for Repository<S, R> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      remote: Arc::clone(&self.remote),
    }
  }
}

fn normalize_paging(page: u32, page_size: u32) -> (u32, u32) {
  if page == 0 || page_size == 0 {
    debug!(page, page_size, "raising paging arguments to 1");
  }
  (page.max(1), page_size.max(1))
}
