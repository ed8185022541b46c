//! Breed repository: coordinates the remote API, the local store and the
//! favorites overlay.

use chrono::{DateTime, Duration, Utc};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use super::client::RemoteSource;
use super::error::{Result, SyncError};
use super::overlay::{apply_favorite_status, favorites_only};
use super::types::{Breed, FavoriteIds};
use crate::cache::{self, CacheMetadata, CacheResult, LocalStore};

/// Source of the current time, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Offline-first access to the breed catalog.
///
/// Page zero is network-first unless the cache is still fresh, and falls
/// back to the cached catalog when the network fails. Later pages are merged
/// into the cache. Favorites are stored separately and overlaid on every
/// read, so they survive catalog refreshes.
pub struct BreedRepository<R: RemoteSource, S: LocalStore> {
  remote: Arc<R>,
  store: Arc<S>,
  ttl: Duration,
  clock: Clock,
}

impl<R: RemoteSource, S: LocalStore> BreedRepository<R, S> {
  pub fn new(remote: Arc<R>, store: Arc<S>) -> Self {
    Self {
      remote,
      store,
      ttl: cache::default_ttl(),
      clock: Arc::new(Utc::now),
    }
  }

  /// Set how long a page-zero fetch keeps the cache fresh.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn with_clock(mut self, clock: Clock) -> Self {
    self.clock = clock;
    self
  }

  fn now(&self) -> DateTime<Utc> {
    (self.clock)()
  }

  /// Get one page of breeds.
  ///
  /// 1. Page zero with a fresh, non-empty cache is served from the cache
  /// 2. Otherwise the page is fetched; page zero replaces the cache, later
  ///    pages are merged into it
  /// 3. If page zero fails to fetch, the cached catalog is returned when
  ///    there is one; later pages that fail to fetch come back empty
  pub async fn get_page(&self, page: u32, page_size: u32) -> Result<Vec<Breed>> {
    self
      .get_page_with_source(page, page_size)
      .await
      .map(|result| result.data)
  }

  /// Same as [`get_page`](Self::get_page), also reporting where the page
  /// came from and, for cached data, when it was fetched.
  ///
  /// A later page that failed to fetch comes back empty and `Offline`.
  pub async fn get_page_with_source(
    &self,
    page: u32,
    page_size: u32,
  ) -> Result<CacheResult<Vec<Breed>>> {
    if page == 0 {
      if let Some(cached) = self.fresh_cache().await? {
        return Ok(cached);
      }
    }

    match self.remote.fetch_page(page, page_size).await {
      Ok(breeds) => self
        .store_page(page, breeds)
        .await
        .map(CacheResult::from_network),
      Err(err) if page == 0 => self.fallback_to_cache(err).await,
      Err(err) => {
        warn!(page, error = %err, "page fetch failed, ending pagination");
        Ok(CacheResult::offline(Vec::new(), None))
      }
    }
  }

  /// Refetch page zero regardless of cache freshness.
  ///
  /// On failure the cache is left as it was and the error is returned.
  pub async fn refresh(&self, page_size: u32) -> Result<Vec<Breed>> {
    let breeds = self
      .remote
      .fetch_page(0, page_size)
      .await
      .map_err(SyncError::Fetch)?;

    self.store_page(0, breeds).await
  }

  /// Look up a breed in the cache. Never touches the network.
  pub async fn get_by_id(&self, id: &str) -> Result<Breed> {
    let mut breed = self
      .store
      .read_item(id)
      .await
      .map_err(SyncError::Storage)?
      .ok_or_else(|| SyncError::NotFound { id: id.to_string() })?;

    breed.is_favorite = self
      .store
      .is_favorite_id(id)
      .await
      .map_err(SyncError::Storage)?;

    Ok(breed)
  }

  /// Cached breeds that are currently favorited.
  pub async fn favorites_snapshot(&self) -> Result<Vec<Breed>> {
    let ids = self
      .store
      .read_favorite_ids()
      .await
      .map_err(SyncError::Storage)?;

    favorites_from(self.store.as_ref(), &ids).await
  }

  pub async fn add_favorite(&self, id: &str) -> Result<()> {
    self
      .store
      .add_favorite_id(id)
      .await
      .map_err(SyncError::Storage)?;

    info!(id, "added favorite");
    Ok(())
  }

  pub async fn remove_favorite(&self, id: &str) -> Result<()> {
    self
      .store
      .remove_favorite_id(id)
      .await
      .map_err(SyncError::Storage)?;

    info!(id, "removed favorite");
    Ok(())
  }

  /// Pick up favorite changes made through other handles on the same
  /// store, such as another process. Observers are notified on change.
  pub async fn reload_favorites(&self) -> Result<()> {
    self
      .store
      .reload_favorite_ids()
      .await
      .map_err(SyncError::Storage)
  }

  pub async fn is_favorite(&self, id: &str) -> Result<bool> {
    self
      .store
      .is_favorite_id(id)
      .await
      .map_err(SyncError::Storage)
  }

  /// The fresh cached catalog, if any, with favorites applied.
  async fn fresh_cache(&self) -> Result<Option<CacheResult<Vec<Breed>>>> {
    let metadata = match self
      .store
      .read_cache_metadata()
      .await
      .map_err(SyncError::Storage)?
    {
      Some(metadata) if cache::is_valid(self.now(), Some(&metadata)) => metadata,
      _ => return Ok(None),
    };

    let cached = self
      .store
      .read_all_items()
      .await
      .map_err(SyncError::Storage)?;

    if cached.is_empty() {
      return Ok(None);
    }

    debug!(count = cached.len(), "serving fresh cache");
    let breeds = self.with_favorites(cached).await?;
    Ok(Some(CacheResult::from_cache(breeds, metadata.last_fetched_at)))
  }

  async fn store_page(&self, page: u32, breeds: Vec<Breed>) -> Result<Vec<Breed>> {
    if page == 0 {
      let metadata = CacheMetadata::stamped(self.now(), self.ttl);
      self
        .store
        .replace_catalog(&breeds, metadata)
        .await
        .map_err(SyncError::Storage)?;
    } else {
      self
        .store
        .upsert_items(&breeds)
        .await
        .map_err(SyncError::Storage)?;
    }

    debug!(page, count = breeds.len(), "stored fetched page");
    self.with_favorites(breeds).await
  }

  async fn fallback_to_cache(
    &self,
    err: color_eyre::Report,
  ) -> Result<CacheResult<Vec<Breed>>> {
    let cached = self
      .store
      .read_all_items()
      .await
      .map_err(SyncError::Storage)?;

    if cached.is_empty() {
      return Err(SyncError::Fetch(err));
    }

    let cached_at = self
      .store
      .read_cache_metadata()
      .await
      .map_err(SyncError::Storage)?
      .map(|metadata| metadata.last_fetched_at);

    info!(count = cached.len(), error = %err, "network unavailable, serving cached breeds");
    let breeds = self.with_favorites(cached).await?;
    Ok(CacheResult::offline(breeds, cached_at))
  }

  async fn with_favorites(&self, breeds: Vec<Breed>) -> Result<Vec<Breed>> {
    let ids = self
      .store
      .read_favorite_ids()
      .await
      .map_err(SyncError::Storage)?;

    Ok(apply_favorite_status(breeds, &ids))
  }
}

impl<R: RemoteSource, S: LocalStore + 'static> BreedRepository<R, S> {
  /// Stream of favorited breeds.
  ///
  /// Emits the current favorites on subscription, then again whenever the
  /// favorite-id set changes. A failed catalog read is emitted as an `Err`
  /// item and the stream keeps going.
  pub fn observe_favorites(&self) -> BoxStream<'static, Result<Vec<Breed>>> {
    let store = Arc::clone(&self.store);

    self
      .observe_favorite_ids()
      .then(move |ids| {
        let store = Arc::clone(&store);
        async move {
          let result = favorites_from(store.as_ref(), &ids).await;
          if let Err(err) = &result {
            warn!(error = %err, "failed to read favorite breeds");
          }
          result
        }
      })
      .boxed()
  }

  /// Stream of the raw favorite-id set, starting with the current one.
  pub fn observe_favorite_ids(&self) -> BoxStream<'static, FavoriteIds> {
    WatchStream::new(self.store.subscribe_favorite_ids()).boxed()
  }
}

impl<R: RemoteSource, S: LocalStore> Clone for BreedRepository<R, S> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      store: Arc::clone(&self.store),
      ttl: self.ttl,
      clock: Arc::clone(&self.clock),
    }
  }
}

async fn favorites_from<S: LocalStore + ?Sized>(
  store: &S,
  ids: &FavoriteIds,
) -> Result<Vec<Breed>> {
  let catalog = store.read_all_items().await.map_err(SyncError::Storage)?;
  Ok(favorites_only(catalog, ids))
}
