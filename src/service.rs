//! Filter service: answers channel requests using a store and an engine.
//!
//! Each request gets exactly one response. Store failures become
//! `FilterResponse::Error`, except settings reads, which fall back to
//! `Settings::default()` (filter disabled) so a caller can always render.

use crate::config::TrainingConfig;
use crate::engine::{DecisionEngine, ModelSummary};
use crate::error::{FeedsiftError, Result};
use crate::protocol::{FilterRequest, FilterResponse};
use crate::storage::{PreferenceStore, StoreCounts};
use crate::types::{ContentId, ContentItem, Settings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a retrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainOutcome {
    pub trained: bool,
    pub rated_count: usize,
}

/// Snapshot of store, model and ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub store: StoreCounts,
    pub model: ModelSummary,
    pub tracked_items: usize,
    pub hidden_items: usize,
    pub pending_retrain: bool,
}

/// Request handler wiring a preference store to a decision engine
pub struct FilterService {
    engine: Arc<DecisionEngine>,
    store: Arc<dyn PreferenceStore>,
    retrain_on_rating: bool,
}

impl FilterService {
    pub fn new(
        engine: Arc<DecisionEngine>,
        store: Arc<dyn PreferenceStore>,
        training: &TrainingConfig,
    ) -> Self {
        Self {
            engine,
            store,
            retrain_on_rating: training.retrain_on_rating,
        }
    }

    pub fn engine(&self) -> &Arc<DecisionEngine> {
        &self.engine
    }

    /// Answer one request
    pub async fn handle(&self, request: FilterRequest) -> FilterResponse {
        let action = request.action();
        debug!("Handling {} request", action);

        let result = match request {
            FilterRequest::SaveRating { item } => self.save_rating(item).await,
            FilterRequest::Predict { id, text } => self.predict(id, text).await,
            FilterRequest::GetSettings => Ok(FilterResponse::Settings {
                settings: self.settings().await,
            }),
            FilterRequest::UpdateSettings { settings } => self.update_settings(settings).await,
        };

        result.unwrap_or_else(|e| {
            warn!("{} request failed: {}", action, e);
            FilterResponse::error(e.to_string())
        })
    }

    async fn save_rating(&self, item: ContentItem) -> Result<FilterResponse> {
        let rating = item.rating_value().ok_or_else(|| {
            FeedsiftError::InvalidRating(format!("saveRating for {} carries no rating", item.id))
        })?;

        // Keep the first extraction of the item; only the rating changes
        let existing = self.store.get(&item.id).await?;
        let mut stored = existing.unwrap_or(item);
        self.engine.record_rating(&mut stored, rating);
        self.store.put(&stored).await?;
        if self.engine.refresh(&stored) {
            debug!("Refreshed tracked item {} with the user's rating", stored.id);
        }

        if self.retrain_on_rating {
            let outcome = self.retrain().await?;
            Ok(FilterResponse::Rated {
                trained: outcome.trained,
                rated_count: outcome.rated_count,
            })
        } else {
            let counts = self.store.count().await?;
            Ok(FilterResponse::Rated {
                trained: self.engine.is_ready(),
                rated_count: counts.rated,
            })
        }
    }

    async fn predict(&self, id: ContentId, text: String) -> Result<FilterResponse> {
        // A stored rating must win over the model, so a failed lookup is an error
        let stored = self.store.get(&id).await?;
        let item = match stored {
            Some(stored) => stored,
            None => ContentItem::new(id, String::new(), text),
        };

        let settings = self.settings().await;
        let evaluation = self.engine.evaluate(&item, &settings);

        Ok(FilterResponse::Prediction {
            result: evaluation.result,
            hide: evaluation.hide,
        })
    }

    /// Current settings, or defaults if the store cannot be read
    pub async fn settings(&self) -> Settings {
        match self.store.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    async fn update_settings(&self, settings: Settings) -> Result<FilterResponse> {
        self.store.put_settings(&settings).await?;
        info!(
            "Settings updated: filter {} at {}%",
            if settings.filter_enabled { "enabled" } else { "disabled" },
            settings.filter_threshold
        );
        Ok(FilterResponse::Settings { settings })
    }

    /// Rebuild the model from every rated item in the store
    pub async fn retrain(&self) -> Result<TrainOutcome> {
        let rated = self.store.list_rated().await?;

        // Training is O(total tokens); let other tasks run around it
        tokio::task::yield_now().await;
        let trained = self.engine.train(&rated);
        tokio::task::yield_now().await;

        Ok(TrainOutcome {
            trained,
            rated_count: rated.len(),
        })
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        Ok(ServiceStatus {
            store: self.store.count().await?,
            model: self.engine.model_summary(),
            tracked_items: self.engine.tracked_items(),
            hidden_items: self.engine.hidden_items(),
            pending_retrain: self.engine.corpus_changed(),
        })
    }
}
