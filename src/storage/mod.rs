//! Preference store: persistence for content items, ratings and settings
//!
//! The engine never talks to storage directly. The service layer reads the
//! rated corpus from a store before every training run and never caches it.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{ContentId, ContentItem, Settings};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Item totals reported by a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCounts {
    pub items: usize,
    pub rated: usize,
}

/// Key-value persistence required by the filter service
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Insert or replace an item (keyed by its ID)
    async fn put(&self, item: &ContentItem) -> Result<()>;

    /// Fetch an item by ID
    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>>;

    /// Every item that carries a rating, in ID order
    async fn list_rated(&self) -> Result<Vec<ContentItem>>;

    /// Stored settings, or `Settings::default()` if none were saved
    async fn get_settings(&self) -> Result<Settings>;

    /// Replace the settings. Rejects thresholds above 100.
    async fn put_settings(&self, settings: &Settings) -> Result<()>;

    /// Item and rated-item totals
    async fn count(&self) -> Result<StoreCounts>;
}
