//! Offline-first access to TheCatAPI breed catalog.
//!
//! [`breeds::BreedRepository`] serves breeds from a local SQLite cache when it
//! is fresh, fetches from the network otherwise, and falls back to stale data
//! when the network is unavailable. Favorites are kept in their own table and
//! can be observed as a stream.

pub mod breeds;
pub mod cache;
pub mod config;
pub mod logging;
