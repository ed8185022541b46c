//! Favorite status overlay.

use super::types::{Breed, FavoriteIds};

/// Mark each breed as favorite iff its id is in `favorite_ids`.
///
/// Order and every other field are preserved.
pub fn apply_favorite_status(breeds: Vec<Breed>, favorite_ids: &FavoriteIds) -> Vec<Breed> {
  breeds
    .into_iter()
    .map(|mut breed| {
      breed.is_favorite = favorite_ids.contains(&breed.id);
      breed
    })
    .collect()
}

/// Keep only favorited breeds, all marked as favorite.
pub fn favorites_only(breeds: Vec<Breed>, favorite_ids: &FavoriteIds) -> Vec<Breed> {
  breeds
    .into_iter()
    .filter(|breed| favorite_ids.contains(&breed.id))
    .map(|mut breed| {
      breed.is_favorite = true;
      breed
    })
    .collect()
}
