//! Fixtures and fakes shared by the unit tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use super::client::RemoteSource;
use super::types::{Breed, FavoriteIds, Lifespan};
use crate::cache::{CacheMetadata, LocalStore, SqliteStore};

pub fn breed(id: &str) -> Breed {
  Breed {
    id: id.to_string(),
    name: format!("Breed {}", id),
    image_url: format!("https://cdn2.thecatapi.com/images/{}.jpg", id),
    origin: "Egypt".to_string(),
    temperament: "Active, Energetic".to_string(),
    description: "Easy to care for".to_string(),
    lifespan: Lifespan::new(14, 15),
    is_favorite: false,
  }
}

pub fn breeds(ids: &[&str]) -> Vec<Breed> {
  ids.iter().map(|id| breed(id)).collect()
}

/// Scripted remote source that records every call.
#[derive(Default)]
pub struct FakeRemote {
  pages: Mutex<HashMap<u32, Vec<Breed>>>,
  failing: AtomicBool,
  calls: Mutex<Vec<(u32, u32)>>,
}

impl FakeRemote {
  pub fn set_page(&self, page: u32, breeds: Vec<Breed>) {
    self.pages.lock().unwrap().insert(page, breeds);
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn calls(&self) -> Vec<(u32, u32)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl RemoteSource for FakeRemote {
  async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Breed>> {
    self.calls.lock().unwrap().push((page, page_size));

    if self.failing.load(Ordering::SeqCst) {
      return Err(eyre!("network unreachable"));
    }

    Ok(
      self
        .pages
        .lock()
        .unwrap()
        .get(&page)
        .cloned()
        .unwrap_or_default(),
    )
  }
}

/// In-memory store whose catalog reads can be made to fail.
pub struct FlakyStore {
  inner: SqliteStore,
  failing: AtomicBool,
}

impl FlakyStore {
  pub fn new() -> Self {
    Self {
      inner: SqliteStore::open_in_memory().unwrap(),
      failing: AtomicBool::new(false),
    }
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }
}

#[async_trait]
impl LocalStore for FlakyStore {
  async fn read_all_items(&self) -> Result<Vec<Breed>> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(eyre!("disk I/O error"));
    }
    self.inner.read_all_items().await
  }

  async fn read_item(&self, id: &str) -> Result<Option<Breed>> {
    self.inner.read_item(id).await
  }

  async fn replace_all_items(&self, breeds: &[Breed]) -> Result<()> {
    self.inner.replace_all_items(breeds).await
  }

  async fn replace_catalog(&self, breeds: &[Breed], metadata: CacheMetadata) -> Result<()> {
    self.inner.replace_catalog(breeds, metadata).await
  }

  async fn upsert_items(&self, breeds: &[Breed]) -> Result<()> {
    self.inner.upsert_items(breeds).await
  }

  async fn read_favorite_ids(&self) -> Result<FavoriteIds> {
    self.inner.read_favorite_ids().await
  }

  fn subscribe_favorite_ids(&self) -> watch::Receiver<FavoriteIds> {
    self.inner.subscribe_favorite_ids()
  }

  async fn reload_favorite_ids(&self) -> Result<()> {
    self.inner.reload_favorite_ids().await
  }

  async fn add_favorite_id(&self, id: &str) -> Result<()> {
    self.inner.add_favorite_id(id).await
  }

  async fn remove_favorite_id(&self, id: &str) -> Result<()> {
    self.inner.remove_favorite_id(id).await
  }

  async fn is_favorite_id(&self, id: &str) -> Result<bool> {
    self.inner.is_favorite_id(id).await
  }

  async fn read_cache_metadata(&self) -> Result<Option<CacheMetadata>> {
    self.inner.read_cache_metadata().await
  }

  async fn write_cache_metadata(&self, metadata: CacheMetadata) -> Result<()> {
    self.inner.write_cache_metadata(metadata).await
  }
}
