//! Core traits and types for the local store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use tokio::sync::watch;

use crate::breeds::{Breed, FavoriteIds};

/// Freshness record for the cached catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetadata {
  /// When page zero was last fetched from the network
  pub last_fetched_at: DateTime<Utc>,
  /// When the cached catalog stops being trusted
  pub expires_at: DateTime<Utc>,
}

impl CacheMetadata {
  /// Stamp a fetch made at `fetched_at`, valid for `ttl`.
  ///
  /// A TTL reaching past the representable range never expires.
  pub fn stamped(fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
    Self {
      last_fetched_at: fetched_at,
      expires_at: fetched_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
  }
}

/// Result from a cache-backed read, including where the data came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data that is still fresh.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result for offline mode.
  ///
  /// `cached_at` is `None` when the cache holds data but was never stamped.
  pub fn offline(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheResult<U> {
    CacheResult {
      data: f(self.data),
      source: self.source,
      cached_at: self.cached_at,
    }
  }

  pub fn is_offline(&self) -> bool {
    self.source == CacheSource::Offline
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Offline mode - network unavailable, serving cached data
  Offline,
}

/// Durable storage for the breed catalog, its freshness record and the
/// favorite-id set.
///
/// The catalog and the favorites are independent: no catalog write may
/// touch favorites.
#[async_trait]
pub trait LocalStore: Send + Sync {
  /// All cached breeds, with `is_favorite` unset.
  async fn read_all_items(&self) -> Result<Vec<Breed>>;

  async fn read_item(&self, id: &str) -> Result<Option<Breed>>;

  /// Atomically replace the whole catalog.
  async fn replace_all_items(&self, breeds: &[Breed]) -> Result<()>;

  /// Replace the whole catalog and write its freshness record together.
  /// Either both land or neither does.
  async fn replace_catalog(&self, breeds: &[Breed], metadata: CacheMetadata) -> Result<()>;

  /// Insert or replace by id, leaving other cached breeds untouched.
  async fn upsert_items(&self, breeds: &[Breed]) -> Result<()>;

  async fn read_favorite_ids(&self) -> Result<FavoriteIds>;

  /// Watch the favorite-id set. The receiver starts at the current set.
  fn subscribe_favorite_ids(&self) -> watch::Receiver<FavoriteIds>;

  /// Re-read the favorite-id set from durable storage and notify watchers
  /// if it changed. Picks up writes made by other handles on the same data.
  async fn reload_favorite_ids(&self) -> Result<()>;

  async fn add_favorite_id(&self, id: &str) -> Result<()>;

  async fn remove_favorite_id(&self, id: &str) -> Result<()>;

  async fn is_favorite_id(&self, id: &str) -> Result<bool>;

  async fn read_cache_metadata(&self) -> Result<Option<CacheMetadata>>;

  async fn write_cache_metadata(&self, metadata: CacheMetadata) -> Result<()>;
}
