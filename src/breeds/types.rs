use std::collections::HashSet;

/// Stable breed identifier assigned by the remote API (e.g. "abys").
pub type BreedId = String;

/// Set of favorited breed ids.
pub type FavoriteIds = HashSet<BreedId>;

/// Expected lifespan in years, as a closed range with `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lifespan {
  low: u32,
  high: u32,
}

impl Lifespan {
  /// Build a range from two bounds in either order.
  pub fn new(a: u32, b: u32) -> Self {
    Self {
      low: a.min(b),
      high: a.max(b),
    }
  }

  pub fn low(&self) -> u32 {
    self.low
  }

  pub fn high(&self) -> u32 {
    self.high
  }

  pub fn midpoint(&self) -> f64 {
    (self.low as f64 + self.high as f64) / 2.0
  }
}

/// A catalog entry.
///
/// `is_favorite` is derived: it is never stored with the breed record and is
/// always recomputed from the favorite-id set before a breed leaves the
/// repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breed {
  pub id: BreedId,
  pub name: String,
  pub image_url: String,
  pub origin: String,
  pub temperament: String,
  pub description: String,
  pub lifespan: Lifespan,
  pub is_favorite: bool,
}
