//! SQLite preference store
//!
//! Uses rusqlite behind a deadpool-sqlite connection pool. Timestamps are
//! stored as epoch milliseconds, ratings as the signed integers 1 / -1.

use crate::error::{FeedsiftError, Result};
use crate::storage::{PreferenceStore, StoreCounts};
use crate::types::{ContentId, ContentItem, Rating, Settings, UserRating};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_sqlite::{Config, Pool, Runtime};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS content_items (
    id TEXT PRIMARY KEY,
    author TEXT NOT NULL,
    text TEXT NOT NULL,
    discovered_at INTEGER NOT NULL,
    rating INTEGER CHECK (rating IN (1, -1)),
    rated_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_content_items_rated ON content_items(rating) WHERE rating IS NOT NULL;
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    filter_enabled INTEGER NOT NULL,
    filter_threshold INTEGER NOT NULL
);
"#;

const SELECT_ITEM: &str =
    "SELECT id, author, text, discovered_at, rating, rated_at FROM content_items";

/// Raw row before conversion into a `ContentItem`
type ItemRow = (String, String, String, i64, Option<i64>, Option<i64>);

/// SQLite-backed preference store
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and ensure the schema exists
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();
        info!("Opening preference store at {}", path_str);

        let config = Config::new(path_str);
        let pool = config.create_pool(Runtime::Tokio1).map_err(|e| {
            FeedsiftError::Database(format!("Failed to create connection pool: {}", e))
        })?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        self.interact(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        debug!("Preference store schema ready");
        Ok(())
    }

    /// Run `f` on a pooled connection
    async fn interact<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| {
            FeedsiftError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        conn.interact(f)
            .await
            .map_err(|e| FeedsiftError::Database(format!("Pool interaction failed: {}", e)))?
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FeedsiftError::Database(format!("Invalid stored timestamp: {}", millis)))
}

fn row_to_item(row: ItemRow) -> Result<ContentItem> {
    let (id, author, text, discovered_at, rating, rated_at) = row;

    let rating = match (rating, rated_at) {
        (Some(value), Some(at)) => {
            let value = i8::try_from(value)
                .map_err(|_| FeedsiftError::Database(format!("Invalid stored rating: {}", value)))
                .and_then(Rating::try_from)?;
            Some(UserRating {
                value,
                rated_at: timestamp(at)?,
            })
        }
        _ => None,
    };

    Ok(ContentItem {
        id: ContentId(id),
        author,
        text,
        discovered_at: timestamp(discovered_at)?,
        rating,
    })
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

#[async_trait]
impl PreferenceStore for SqliteStore {
    async fn put(&self, item: &ContentItem) -> Result<()> {
        let item = item.clone();
        debug!("Storing content item {}", item.id);

        self.interact(move |conn| {
            conn.execute(
                "INSERT INTO content_items (id, author, text, discovered_at, rating, rated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    author = excluded.author,
                    text = excluded.text,
                    discovered_at = excluded.discovered_at,
                    rating = excluded.rating,
                    rated_at = excluded.rated_at",
                rusqlite::params![
                    item.id.0,
                    item.author,
                    item.text,
                    item.discovered_at.timestamp_millis(),
                    item.rating.map(|r| i64::from(r.value.value())),
                    item.rating.map(|r| r.rated_at.timestamp_millis()),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let id = id.0.clone();
        let row = self
            .interact(move |conn| {
                let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_ITEM))?;
                let result = stmt.query_row(rusqlite::params![id], read_row);
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        row.map(row_to_item).transpose()
    }

    async fn list_rated(&self) -> Result<Vec<ContentItem>> {
        let rows = self
            .interact(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE rating IS NOT NULL ORDER BY id",
                    SELECT_ITEM
                ))?;
                let rows = stmt
                    .query_map([], read_row)?
                    .collect::<rusqlite::Result<Vec<ItemRow>>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn get_settings(&self) -> Result<Settings> {
        let stored = self
            .interact(|conn| {
                let result = conn.query_row(
                    "SELECT filter_enabled, filter_threshold FROM settings WHERE id = 1",
                    [],
                    |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        match stored {
            Some((filter_enabled, threshold)) => {
                let filter_threshold = u8::try_from(threshold).map_err(|_| {
                    FeedsiftError::Database(format!("Invalid stored threshold: {}", threshold))
                })?;
                let settings = Settings {
                    filter_enabled,
                    filter_threshold,
                };
                settings.validate()?;
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    async fn put_settings(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;
        let settings = *settings;

        self.interact(move |conn| {
            conn.execute(
                "INSERT INTO settings (id, filter_enabled, filter_threshold) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                    filter_enabled = excluded.filter_enabled,
                    filter_threshold = excluded.filter_threshold",
                rusqlite::params![settings.filter_enabled, i64::from(settings.filter_threshold)],
            )?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> Result<StoreCounts> {
        self.interact(|conn| {
            let (items, rated): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(rating) FROM content_items",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(StoreCounts {
                items: items as usize,
                rated: rated as usize,
            })
        })
        .await
    }
}
