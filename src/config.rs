use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::{SqliteStore, DEFAULT_TTL_HOURS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Breeds per page when listing
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      cache: CacheConfig::default(),
      page_size: default_page_size(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Request timeout for the remote API
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a fetched catalog stays fresh
  #[serde(default = "default_ttl_hours")]
  pub ttl_hours: i64,
  /// Database location (defaults to the user data directory)
  pub database: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_hours: default_ttl_hours(),
      database: None,
    }
  }
}

impl CacheConfig {
  pub fn database_path(&self) -> Result<PathBuf> {
    match &self.database {
      Some(path) => Ok(path.clone()),
      None => SqliteStore::default_path(),
    }
  }
}

fn default_base_url() -> String {
  "https://api.thecatapi.com/v1/".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

/// Longest accepted cache TTL: ten years.
const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

fn default_ttl_hours() -> i64 {
  DEFAULT_TTL_HOURS
}

fn default_page_size() -> u32 {
  10
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./catz.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/catz/config.yaml
  ///
  /// Falls back to defaults when no file is found.
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
    let local = PathBuf::from("catz.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("catz").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.page_size == 0 {
      return Err(eyre!("page_size must be greater than zero"));
    }
    if config.cache.ttl_hours <= 0 {
      return Err(eyre!("cache.ttl_hours must be greater than zero"));
    }
    if config.cache.ttl_hours > MAX_TTL_HOURS {
      return Err(eyre!(
        "cache.ttl_hours must be at most {} (ten years)",
        MAX_TTL_HOURS
      ));
    }
    Ok(config)
  }

  /// Get TheCatAPI key from environment variables.
  ///
  /// Checks CATZ_API_KEY first, then CAT_API_KEY as fallback. The public API
  /// accepts anonymous requests, so a missing key is not an error.
  pub fn get_api_key() -> Option<String> {
    std::env::var("CATZ_API_KEY")
      .or_else(|_| std::env::var("CAT_API_KEY"))
      .ok()
      .filter(|key| !key.trim().is_empty())
  }
}
