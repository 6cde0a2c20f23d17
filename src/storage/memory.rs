//! In-process store backed by a hash map. Used by tests and ephemeral runs.

use crate::error::Result;
use crate::storage::{PreferenceStore, StoreCounts};
use crate::types::{ContentId, ContentItem, Settings};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<ContentId, ContentItem>>,
    settings: RwLock<Option<Settings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn put(&self, item: &ContentItem) -> Result<()> {
        self.items.write().await.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn list_rated(&self) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;
        let mut rated: Vec<ContentItem> = items.values().filter(|i| i.is_rated()).cloned().collect();
        rated.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rated)
    }

    async fn get_settings(&self) -> Result<Settings> {
        Ok(self.settings.read().await.unwrap_or_default())
    }

    async fn put_settings(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;
        *self.settings.write().await = Some(*settings);
        Ok(())
    }

    async fn count(&self) -> Result<StoreCounts> {
        let items = self.items.read().await;
        Ok(StoreCounts {
            items: items.len(),
            rated: items.values().filter(|i| i.is_rated()).count(),
        })
    }
}
