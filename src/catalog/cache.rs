//! Caching descriptors for catalog types.

use crate::cache::{Entity, KeyField, RefreshPolicy};

use super::types::{Animal, Breed, Shelter, Species, User};

fn non_empty(s: &str) -> Option<&str> {
  Some(s).filter(|s| !s.is_empty())
}

impl Entity for Animal {
  const ENTITY_TYPE: &'static str = "animal";
  const ENDPOINT: &'static str = "animals";
  const NATURAL_KEY: KeyField = KeyField::Slug;
  const REFRESH: RefreshPolicy = RefreshPolicy::BeyondFirstPage;

  fn id(&self) -> &str {
    &self.id
  }

  fn slug(&self) -> Option<&str> {
    non_empty(&self.slug)
  }

  fn updated_at(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

impl Entity for Shelter {
  const ENTITY_TYPE: &'static str = "shelter";
  const ENDPOINT: &'static str = "shelters";
  const NATURAL_KEY: KeyField = KeyField::Slug;
  const REFRESH: RefreshPolicy = RefreshPolicy::BeyondFirstPage;

  fn id(&self) -> &str {
    &self.id
  }

  fn slug(&self) -> Option<&str> {
    non_empty(&self.slug)
  }

  fn updated_at(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

impl Entity for Species {
  const ENTITY_TYPE: &'static str = "species";
  const ENDPOINT: &'static str = "species";

  fn id(&self) -> &str {
    &self.id
  }
}

impl Entity for Breed {
  const ENTITY_TYPE: &'static str = "breed";
  const ENDPOINT: &'static str = "breeds";

  fn id(&self) -> &str {
    &self.id
  }
}

impl Entity for User {
  const ENTITY_TYPE: &'static str = "user";
  const ENDPOINT: &'static str = "users";

  fn id(&self) -> &str {
    &self.id
  }

  fn updated_at(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::Lookup;

  #[test]
  fn natural_keys() {
    assert_eq!(Lookup::natural::<Animal>("fido"), Lookup::Slug("fido".into()));
    assert_eq!(Lookup::natural::<Shelter>("paws"), Lookup::Slug("paws".into()));
    assert_eq!(Lookup::natural::<Breed>("b1"), Lookup::Id("b1".into()));
    assert_eq!(Lookup::natural::<User>("u1"), Lookup::Id("u1".into()));
  }

  #[test]
  fn empty_slug_is_absent() {
    let animal = Animal {
      id: "a1".into(),
      ..Default::default()
    };
    assert_eq!(animal.slug(), None);
    assert!(!Lookup::Slug(String::new()).matches(&animal));
  }

  #[test]
  fn refresh_policy_per_kind() {
    assert_eq!(Animal::REFRESH, RefreshPolicy::BeyondFirstPage);
    assert_eq!(Shelter::REFRESH, RefreshPolicy::BeyondFirstPage);
    assert_eq!(Species::REFRESH, RefreshPolicy::PreferCache);
    assert_eq!(Breed::REFRESH, RefreshPolicy::PreferCache);
    assert_eq!(User::REFRESH, RefreshPolicy::PreferCache);
  }
}
