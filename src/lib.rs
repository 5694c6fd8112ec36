//! Offline-first data access for the PetCare animal catalog.
//!
//! Reads go through [`Repository`], which serves records from a local
//! [`SqliteStorage`] and reconciles it with a [`RemoteSource`]:
//!
//! - collections are delivered from the store first and may be superseded by
//!   a network refresh, so a read yields a [`Feed`] rather than a single value
//! - keyed reads trust the store and only go to the network on a miss
//! - network failures fall back to cached data, never to an error

pub mod cache;
pub mod catalog;
pub mod remote;

pub use cache::{Entity, EntityStore, Feed, Lookup, Snapshot, Source, SqliteStorage};
pub use catalog::{Animal, Breed, EntityKind, Repository, Shelter, Species, User};
pub use remote::{HttpRemote, MemoryRemote, RemoteError, RemoteSource};
