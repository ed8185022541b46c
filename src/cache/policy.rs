//! Cache freshness policy.

use chrono::{DateTime, Duration, Utc};

use super::traits::CacheMetadata;

/// Key of the single catalog freshness record.
pub const BREEDS_CACHE_KEY: &str = "breeds_list";

/// How long a page-zero fetch keeps the catalog fresh, in hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

pub fn default_ttl() -> Duration {
  Duration::hours(DEFAULT_TTL_HOURS)
}

/// Whether the cached catalog can be served without hitting the network.
pub fn is_valid(now: DateTime<Utc>, metadata: Option<&CacheMetadata>) -> bool {
  metadata.is_some_and(|m| now < m.expires_at)
}
