use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cache::Entity;

use super::types::{Animal, Breed, Shelter, Species, User};

/// Runtime name of a catalog entity kind, for callers that pick the kind
/// dynamically (the CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Animal,
  Shelter,
  Species,
  Breed,
  User,
}

impl EntityKind {
  pub const ALL: [EntityKind; 5] = [
    EntityKind::Animal,
    EntityKind::Shelter,
    EntityKind::Species,
    EntityKind::Breed,
    EntityKind::User,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Animal => Animal::ENTITY_TYPE,
      Self::Shelter => Shelter::ENTITY_TYPE,
      Self::Species => Species::ENTITY_TYPE,
      Self::Breed => Breed::ENTITY_TYPE,
      Self::User => User::ENTITY_TYPE,
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
#[error("unknown entity kind {0:?} (expected one of: animal, shelter, species, breed, user)")]
pub struct UnknownKind(String);

impl FromStr for EntityKind {
  type Err = UnknownKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|kind| {
        kind.as_str() == normalized || Self::plural(*kind) == normalized
      })
      .ok_or_else(|| UnknownKind(s.to_string()))
  }
}

impl EntityKind {
  fn plural(self) -> &'static str {
    match self {
      Self::Animal => Animal::ENDPOINT,
      Self::Shelter => Shelter::ENDPOINT,
      Self::Species => Species::ENDPOINT,
      Self::Breed => Breed::ENDPOINT,
      Self::User => User::ENDPOINT,
    }
  }
}
