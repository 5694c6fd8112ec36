//! PetCare catalog: animals, shelters, species, breeds and users.

mod cache;
pub mod detail;
mod kind;
mod repository;
pub mod types;

pub use detail::{AnimalDetail, ShelterDetail};
pub use kind::{EntityKind, UnknownKind};
pub use repository::Repository;
pub use types::{Animal, Breed, Coordinates, Shelter, Species, User};
