use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use petcare_offline::cache::{EntityStore, Snapshot, SqliteStorage};
use petcare_offline::catalog::{Animal, Breed, EntityKind, Repository, Shelter, Species, User};
use petcare_offline::remote::HttpRemote;
use petcare_offline::Entity;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "petcare")]
#[command(about = "Offline-first client for the PetCare animal catalog")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: ./petcare.yaml or $XDG_CONFIG_HOME/petcare/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// Cache database file, or ":memory:" for a throwaway cache
  #[arg(long)]
  pub db: Option<String>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  pub log_file: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List a page of records
  List {
    /// animal, shelter, species, breed or user
    kind: EntityKind,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    page_size: Option<u32>,
    /// Print every delivery (cache, then refresh) instead of the final one
    #[arg(long)]
    follow: bool,
  },
  /// Get one record by natural key (slug for animals and shelters, id otherwise)
  Get { kind: EntityKind, key: String },
  /// An animal with its breed, species, shelter and owner
  Animal { slug: String },
  /// A shelter with its manager
  Shelter { slug: String },
  /// Show what the local cache holds, without touching the network
  Cache { kind: EntityKind },
}

/// Run `$body` with `$t` bound to the record type for `$kind`.
macro_rules! with_kind {
  ($kind:expr, $t:ident => $body:expr) => {
    match $kind {
      EntityKind::Animal => {
        type $t = Animal;
        $body
      }
      EntityKind::Shelter => {
        type $t = Shelter;
        $body
      }
      EntityKind::Species => {
        type $t = Species;
        $body
      }
      EntityKind::Breed => {
        type $t = Breed;
        $body
      }
      EntityKind::User => {
        type $t = User;
        $body
      }
    }
  };
}

pub async fn run(args: Args, config: Config) -> Result<()> {
  let storage = Arc::new(open_storage(args.db.as_deref(), &config)?);

  if let Command::Cache { kind } = &args.command {
    return with_kind!(*kind, T => print_cached::<T>(&storage));
  }

  let remote = HttpRemote::new(
    &config.api_base_url()?,
    config.api_timeout(),
    Config::get_api_token(),
  )
  .map_err(|e| eyre!("Failed to set up API client: {}", e))?;
  let repo = Repository::from_shared(storage, Arc::new(remote));

  match args.command {
    Command::List {
      kind,
      page,
      page_size,
      follow,
    } => {
      let page_size = page_size.unwrap_or(config.defaults.page_size);
      with_kind!(kind, T => list::<T>(&repo, page, page_size, follow).await)
    }
    Command::Get { kind, key } => {
      with_kind!(kind, T => print_found(repo.get_by_key::<T>(&key).await, kind, &key))
    }
    Command::Animal { slug } => {
      print_found(repo.animal_detail(&slug).await, EntityKind::Animal, &slug)
    }
    Command::Shelter { slug } => {
      print_found(repo.shelter_detail(&slug).await, EntityKind::Shelter, &slug)
    }
    Command::Cache { .. } => Ok(()),
  }
}

fn open_storage(db: Option<&str>, config: &Config) -> Result<SqliteStorage> {
  let storage = match db {
    Some(":memory:") => SqliteStorage::open_in_memory(),
    Some(path) => SqliteStorage::open_at(path.as_ref()),
    None => match &config.cache.path {
      Some(path) => SqliteStorage::open_at(path),
      None => SqliteStorage::open(),
    },
  };
  storage.map_err(|e| eyre!("Failed to open cache: {}", e))
}

async fn list<T: Entity>(
  repo: &Repository<SqliteStorage, HttpRemote>,
  page: u32,
  page_size: u32,
  follow: bool,
) -> Result<()> {
  let mut feed = repo.get_page::<T>(page, page_size).await;

  if follow {
    while let Some(snapshot) = feed.next().await {
      print_json(&snapshot)?;
    }
  } else if let Some(snapshot) = feed.settled().await {
    print_json(&snapshot)?;
  }

  Ok(())
}

fn print_cached<T: Entity>(storage: &SqliteStorage) -> Result<()> {
  let cached = storage
    .get_all::<T>()
    .map_err(|e| eyre!("Failed to read cache: {}", e))?;

  let oldest = cached.iter().map(|c| c.cached_at).min();
  let records = cached.into_iter().map(|c| c.entity).collect::<Vec<T>>();
  print_json(&Snapshot::from_cache(records, oldest))
}

fn print_found<V: Serialize>(value: Option<V>, kind: EntityKind, key: &str) -> Result<()> {
  match value {
    Some(value) => print_json(&value),
    None => Err(eyre!("No {} found for {}", kind, key)),
  }
}

fn print_json<V: Serialize>(value: &V) -> Result<()> {
  let json =
    serde_json::to_string_pretty(value).map_err(|e| eyre!("Failed to encode output: {}", e))?;
  println!("{}", json);
  Ok(())
}
