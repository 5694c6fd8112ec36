#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use petcare_offline::catalog::{Animal, Breed, Shelter, Species, User};
use petcare_offline::{MemoryRemote, Repository, SqliteStorage};

pub type TestRepo = Repository<SqliteStorage, MemoryRemote>;

/// Repository over an in-memory store and scripted remote, with handles to both.
pub fn repo() -> (TestRepo, Arc<SqliteStorage>, Arc<MemoryRemote>) {
  let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
  let remote = Arc::new(MemoryRemote::new());
  let repo = Repository::from_shared(Arc::clone(&storage), Arc::clone(&remote));
  (repo, storage, remote)
}

pub fn animal(id: &str, slug: &str, status: &str) -> Animal {
  Animal {
    id: id.to_string(),
    slug: slug.to_string(),
    name: slug.to_string(),
    status: status.to_string(),
    ..Default::default()
  }
}

pub fn shelter(id: &str, slug: &str) -> Shelter {
  Shelter {
    id: id.to_string(),
    slug: slug.to_string(),
    name: slug.to_string(),
    capacity: 20,
    ..Default::default()
  }
}

pub fn species(id: &str, name: &str) -> Species {
  Species {
    id: id.to_string(),
    name: name.to_string(),
  }
}

pub fn breed(id: &str, species_id: &str, name: &str) -> Breed {
  Breed {
    id: id.to_string(),
    species_id: species_id.to_string(),
    name: name.to_string(),
    description: None,
  }
}

pub fn user(id: &str, first_name: &str) -> User {
  User {
    id: id.to_string(),
    first_name: first_name.to_string(),
    role: "User".to_string(),
    ..Default::default()
  }
}

pub fn ids<T: petcare_offline::Entity>(records: &[T]) -> Vec<String> {
  records.iter().map(|r| r.id().to_string()).collect()
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
  F: FnMut() -> Fut,
  Fut: Future<Output = bool>,
{
  for _ in 0..200 {
    if check().await {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  false
}
