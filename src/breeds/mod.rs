//! Cat breed catalog: domain types, TheCatAPI client and the offline-first
//! repository that ties them to the local cache.

mod api_types;
mod client;
mod error;
mod overlay;
mod repository;
mod types;
pub mod usecase;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{CatApiClient, RemoteSource};
pub use error::{Result, SyncError};
pub use overlay::{apply_favorite_status, favorites_only};
pub use repository::{BreedRepository, Clock};
pub use types::{Breed, BreedId, FavoriteIds, Lifespan};
