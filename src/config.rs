use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub defaults: DefaultsConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Catalog API root, e.g. "http://localhost:3000"
  pub base_url: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: None,
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Database file (defaults to $XDG_DATA_HOME/petcare/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for DefaultsConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

fn default_page_size() -> u32 {
  10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Write logs here instead of stderr
  pub file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./petcare.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/petcare/config.yaml
  ///
  /// Without any file the built-in defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("petcare.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("petcare").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// API root, with PETCARE_API_URL taking precedence over the file.
  pub fn api_base_url(&self) -> Result<String> {
    std::env::var("PETCARE_API_URL")
      .ok()
      .or_else(|| self.api.base_url.clone())
      .ok_or_else(|| {
        eyre!("No API base url configured. Set api.base_url in petcare.yaml or PETCARE_API_URL.")
      })
  }

  pub fn api_timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  /// Optional bearer token from PETCARE_API_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("PETCARE_API_TOKEN")
      .ok()
      .filter(|t| !t.is_empty())
  }
}
