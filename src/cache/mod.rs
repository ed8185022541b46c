//! Local persistence for the breed catalog and favorites.
//!
//! This module provides:
//! - The `LocalStore` seam the repository reads and writes through
//! - A SQLite-backed store with an observable favorite-id set
//! - The freshness policy deciding when the cached catalog can be trusted

mod policy;
mod storage;
mod traits;

pub use policy::{default_ttl, is_valid, BREEDS_CACHE_KEY, DEFAULT_TTL_HOURS};
pub use storage::SqliteStore;
pub use traits::{CacheMetadata, CacheResult, CacheSource, LocalStore};
