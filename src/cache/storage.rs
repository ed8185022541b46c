//! SQLite implementation of the local store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::debug;

use super::policy::BREEDS_CACHE_KEY;
use super::traits::{CacheMetadata, LocalStore};
use crate::breeds::{Breed, FavoriteIds, Lifespan};

/// Schema for the store tables.
const SCHEMA: &str = r#"
-- Cached catalog, in fetch order
CREATE TABLE IF NOT EXISTS breeds (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    image_url TEXT NOT NULL,
    origin TEXT NOT NULL,
    temperament TEXT NOT NULL,
    description TEXT NOT NULL,
    lifespan_low INTEGER NOT NULL,
    lifespan_high INTEGER NOT NULL,
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_breeds_position ON breeds(position);

-- Favorited breed ids, independent of the catalog
CREATE TABLE IF NOT EXISTS favorites (
    breed_id TEXT PRIMARY KEY
);

-- Freshness records, timestamps in UTC milliseconds
CREATE TABLE IF NOT EXISTS cache_metadata (
    cache_key TEXT PRIMARY KEY,
    last_fetched_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
"#;

const SELECT_BREED: &str = "SELECT id, name, image_url, origin, temperament, description, \
                            lifespan_low, lifespan_high FROM breeds";

const UPSERT_BREED: &str = "INSERT INTO breeds (id, name, image_url, origin, temperament, description, lifespan_low, lifespan_high, position)
   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
   ON CONFLICT(id) DO UPDATE SET
     name = excluded.name,
     image_url = excluded.image_url,
     origin = excluded.origin,
     temperament = excluded.temperament,
     description = excluded.description,
     lifespan_low = excluded.lifespan_low,
     lifespan_high = excluded.lifespan_high";

/// SQLite-backed local store.
///
/// Every operation runs under a single connection lock, so a catalog
/// replacement is never visible half-done. The favorite-id set is mirrored
/// into a watch channel that is updated under the same lock.
pub struct SqliteStore {
  conn: Mutex<Connection>,
  favorites: watch::Sender<FavoriteIds>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    debug!(path = %path.display(), "opened cache database");
    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::from_connection(conn)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("catz").join("cache.db"))
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    let favorites = load_favorite_ids(&conn)?;
    let (tx, _) = watch::channel(favorites);

    Ok(Self {
      conn: Mutex::new(conn),
      favorites: tx,
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

fn load_favorite_ids(conn: &Connection) -> Result<FavoriteIds> {
  let mut stmt = conn
    .prepare("SELECT breed_id FROM favorites")
    .map_err(|e| eyre!("Failed to prepare favorites query: {}", e))?;

  let ids = stmt
    .query_map([], |row| row.get::<_, String>(0))
    .map_err(|e| eyre!("Failed to query favorites: {}", e))?
    .collect::<rusqlite::Result<FavoriteIds>>()
    .map_err(|e| eyre!("Failed to read favorite row: {}", e))?;

  Ok(ids)
}

fn breed_from_row(row: &Row<'_>) -> rusqlite::Result<Breed> {
  Ok(Breed {
    id: row.get(0)?,
    name: row.get(1)?,
    image_url: row.get(2)?,
    origin: row.get(3)?,
    temperament: row.get(4)?,
    description: row.get(5)?,
    lifespan: Lifespan::new(row.get(6)?, row.get(7)?),
    is_favorite: false,
  })
}

/// Upsert `breeds`, appending unseen ids after the current last position.
fn upsert_breeds(conn: &Connection, breeds: &[Breed]) -> Result<()> {
  let next_position: i64 = conn
    .query_row(
      "SELECT COALESCE(MAX(position) + 1, 0) FROM breeds",
      [],
      |row| row.get(0),
    )
    .map_err(|e| eyre!("Failed to read catalog position: {}", e))?;

  let mut stmt = conn
    .prepare(UPSERT_BREED)
    .map_err(|e| eyre!("Failed to prepare breed insert: {}", e))?;

  for (offset, breed) in breeds.iter().enumerate() {
    stmt
      .execute(params![
        breed.id,
        breed.name,
        breed.image_url,
        breed.origin,
        breed.temperament,
        breed.description,
        breed.lifespan.low(),
        breed.lifespan.high(),
        next_position + offset as i64,
      ])
      .map_err(|e| eyre!("Failed to store breed {}: {}", breed.id, e))?;
  }

  Ok(())
}

/// Swap the catalog for `breeds`. Callers run this inside a transaction.
fn replace_breeds(conn: &Connection, breeds: &[Breed]) -> Result<()> {
  conn
    .execute("DELETE FROM breeds", [])
    .map_err(|e| eyre!("Failed to clear breeds: {}", e))?;
  upsert_breeds(conn, breeds)
}

fn store_metadata(conn: &Connection, metadata: &CacheMetadata) -> Result<()> {
  conn
    .execute(
      "INSERT OR REPLACE INTO cache_metadata (cache_key, last_fetched_at, expires_at)
       VALUES (?, ?, ?)",
      params![
        BREEDS_CACHE_KEY,
        metadata.last_fetched_at.timestamp_millis(),
        metadata.expires_at.timestamp_millis(),
      ],
    )
    .map_err(|e| eyre!("Failed to write cache metadata: {}", e))?;

  Ok(())
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms).ok_or_else(|| eyre!("Invalid cache timestamp: {}", ms))
}

#[async_trait]
impl LocalStore for SqliteStore {
  async fn read_all_items(&self) -> Result<Vec<Breed>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(&format!("{} ORDER BY position", SELECT_BREED))
      .map_err(|e| eyre!("Failed to prepare breed query: {}", e))?;

    let breeds = stmt
      .query_map([], breed_from_row)
      .map_err(|e| eyre!("Failed to query breeds: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read breed row: {}", e))?;

    Ok(breeds)
  }

  async fn read_item(&self, id: &str) -> Result<Option<Breed>> {
    let conn = self.lock()?;

    conn
      .query_row(
        &format!("{} WHERE id = ?", SELECT_BREED),
        params![id],
        breed_from_row,
      )
      .optional()
      .map_err(|e| eyre!("Failed to read breed {}: {}", id, e))
  }

  async fn replace_all_items(&self, breeds: &[Breed]) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    replace_breeds(&tx, breeds)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(count = breeds.len(), "replaced cached catalog");
    Ok(())
  }

  async fn replace_catalog(&self, breeds: &[Breed], metadata: CacheMetadata) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    replace_breeds(&tx, breeds)?;
    store_metadata(&tx, &metadata)?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(
      count = breeds.len(),
      expires_at = %metadata.expires_at,
      "replaced cached catalog and stamped freshness"
    );
    Ok(())
  }

  async fn upsert_items(&self, breeds: &[Breed]) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    upsert_breeds(&tx, breeds)?;
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    debug!(count = breeds.len(), "merged breeds into cached catalog");
    Ok(())
  }

  async fn read_favorite_ids(&self) -> Result<FavoriteIds> {
    let conn = self.lock()?;
    load_favorite_ids(&conn)
  }

  fn subscribe_favorite_ids(&self) -> watch::Receiver<FavoriteIds> {
    self.favorites.subscribe()
  }

  async fn reload_favorite_ids(&self) -> Result<()> {
    let conn = self.lock()?;
    let current = load_favorite_ids(&conn)?;

    let changed = self.favorites.send_if_modified(|ids| {
      if *ids == current {
        return false;
      }
      *ids = current;
      true
    });

    if changed {
      debug!("favorites changed on disk");
    }
    Ok(())
  }

  async fn add_favorite_id(&self, id: &str) -> Result<()> {
    let conn = self.lock()?;

    let inserted = conn
      .execute(
        "INSERT OR IGNORE INTO favorites (breed_id) VALUES (?)",
        params![id],
      )
      .map_err(|e| eyre!("Failed to add favorite {}: {}", id, e))?;

    if inserted > 0 {
      self
        .favorites
        .send_if_modified(|ids| ids.insert(id.to_string()));
    }

    Ok(())
  }

  async fn remove_favorite_id(&self, id: &str) -> Result<()> {
    let conn = self.lock()?;

    let removed = conn
      .execute("DELETE FROM favorites WHERE breed_id = ?", params![id])
      .map_err(|e| eyre!("Failed to remove favorite {}: {}", id, e))?;

    if removed > 0 {
      self.favorites.send_if_modified(|ids| ids.remove(id));
    }

    Ok(())
  }

  async fn is_favorite_id(&self, id: &str) -> Result<bool> {
    let conn = self.lock()?;

    conn
      .query_row(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE breed_id = ?)",
        params![id],
        |row| row.get(0),
      )
      .map_err(|e| eyre!("Failed to check favorite {}: {}", id, e))
  }

  async fn read_cache_metadata(&self) -> Result<Option<CacheMetadata>> {
    let conn = self.lock()?;

    let row: Option<(i64, i64)> = conn
      .query_row(
        "SELECT last_fetched_at, expires_at FROM cache_metadata WHERE cache_key = ?",
        params![BREEDS_CACHE_KEY],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache metadata: {}", e))?;

    match row {
      Some((fetched, expires)) => Ok(Some(CacheMetadata {
        last_fetched_at: millis_to_datetime(fetched)?,
        expires_at: millis_to_datetime(expires)?,
      })),
      None => Ok(None),
    }
  }

  async fn write_cache_metadata(&self, metadata: CacheMetadata) -> Result<()> {
    let conn = self.lock()?;
    store_metadata(&conn, &metadata)
  }
}
