//! Small operations built on top of the repository for presentation code.

use chrono::{DateTime, Utc};

use super::client::RemoteSource;
use super::error::Result;
use super::repository::BreedRepository;
use super::types::Breed;
use crate::cache::{CacheSource, LocalStore};

/// One page of results plus a guess at whether another page exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
  pub items: Vec<T>,
  /// A full page suggests more data; a short page means the end was reached.
  pub has_more_pages: bool,
  /// Where the items came from
  pub source: CacheSource,
  /// When cached items were fetched, if they came from the cache
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> PageResult<T> {
  /// Cached items served because the network failed.
  pub fn is_offline(&self) -> bool {
    self.source == CacheSource::Offline
  }
}

pub async fn get_breeds_page<R: RemoteSource, S: LocalStore>(
  repository: &BreedRepository<R, S>,
  page: u32,
  page_size: u32,
) -> Result<PageResult<Breed>> {
  let result = repository.get_page_with_source(page, page_size).await?;
  let has_more_pages = result.data.len() == page_size as usize;

  Ok(PageResult {
    items: result.data,
    has_more_pages,
    source: result.source,
    cached_at: result.cached_at,
  })
}

/// Flip a breed's favorite state. Returns the new state.
pub async fn toggle_favorite<R: RemoteSource, S: LocalStore>(
  repository: &BreedRepository<R, S>,
  id: &str,
  currently_favorite: bool,
) -> Result<bool> {
  if currently_favorite {
    repository.remove_favorite(id).await?;
  } else {
    repository.add_favorite(id).await?;
  }

  Ok(!currently_favorite)
}

/// Case-insensitive name filter. A blank query matches everything.
pub fn filter_breeds_by_name(breeds: &[Breed], query: &str) -> Vec<Breed> {
  let query = query.trim();
  if query.is_empty() {
    return breeds.to_vec();
  }

  let needle = query.to_lowercase();
  breeds
    .iter()
    .filter(|b| b.name.to_lowercase().contains(&needle))
    .cloned()
    .collect()
}

/// Mean of each breed's lifespan midpoint, truncated to whole years.
pub fn average_lifespan(breeds: &[Breed]) -> Option<u32> {
  if breeds.is_empty() {
    return None;
  }

  let total: f64 = breeds.iter().map(|b| b.lifespan.midpoint()).sum();
  Some((total / breeds.len() as f64) as u32)
}
