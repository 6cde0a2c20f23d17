//! Per-item interaction bookkeeping.
//!
//! The content source re-reports the same post many times. The ledger keeps
//! one record per content ID so that re-discovery never repeats first-time
//! effects: the record is created once, identity fields stay fixed, and only
//! the volatile prediction fields are refreshed. `has_buttons` and
//! `is_hidden` change only through explicit UI actions.

use crate::types::{ContentId, Label, PredictionResult, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Where an item sits in its display lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPhase {
    /// Seen, nothing decided yet
    Discovered,
    /// The user's own rating drives the result
    RatedByUser,
    /// Model or fallback result attached
    Predicted,
    /// Hidden by a hide action
    Hidden,
    /// Explicitly shown again after being hidden
    Shown,
}

/// Interaction record for one content ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub id: ContentId,
    pub first_seen_at: DateTime<Utc>,
    pub sightings: u64,

    pub has_buttons: bool,
    pub is_hidden: bool,
    /// Set once a hide or show action has been applied
    pub visibility_set: bool,

    pub prediction: Option<Label>,
    pub confidence: Option<f64>,
    pub sentiment: Option<Sentiment>,
    pub is_user_rated: bool,
}

impl InteractionState {
    fn new(id: ContentId) -> Self {
        Self {
            id,
            first_seen_at: Utc::now(),
            sightings: 0,
            has_buttons: false,
            is_hidden: false,
            visibility_set: false,
            prediction: None,
            confidence: None,
            sentiment: None,
            is_user_rated: false,
        }
    }

    pub fn phase(&self) -> ItemPhase {
        if self.is_hidden {
            ItemPhase::Hidden
        } else if self.visibility_set {
            ItemPhase::Shown
        } else if self.is_user_rated {
            ItemPhase::RatedByUser
        } else if self.confidence.is_some() {
            ItemPhase::Predicted
        } else {
            ItemPhase::Discovered
        }
    }
}

/// Interaction ledger keyed by content ID
#[derive(Debug, Default)]
pub struct InteractionLedger {
    entries: HashMap<ContentId, InteractionState>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting. Returns `true` only the first time an ID is seen.
    pub fn observe(&mut self, id: &ContentId) -> bool {
        let mut first = false;
        let state = self.entries.entry(id.clone()).or_insert_with(|| {
            first = true;
            InteractionState::new(id.clone())
        });
        state.sightings += 1;

        if first {
            debug!("Ledger: first sighting of {}", id);
        }
        first
    }

    /// Overwrite the volatile prediction fields with a newer result.
    /// Returns `false` if the ID has never been observed.
    pub fn refresh(&mut self, id: &ContentId, result: &PredictionResult) -> bool {
        match self.entries.get_mut(id) {
            Some(state) => {
                state.prediction = result.label;
                state.confidence = Some(result.confidence);
                state.sentiment = result.sentiment;
                state.is_user_rated = result.is_user_rated;
                true
            }
            None => false,
        }
    }

    /// Note that rating affordances were attached to this item
    pub fn mark_buttons(&mut self, id: &ContentId) -> bool {
        match self.entries.get_mut(id) {
            Some(state) => {
                state.has_buttons = true;
                true
            }
            None => false,
        }
    }

    /// Apply a hide (`true`) or show (`false`) action
    pub fn set_hidden(&mut self, id: &ContentId, hidden: bool) -> bool {
        match self.entries.get_mut(id) {
            Some(state) => {
                state.is_hidden = hidden;
                state.visibility_set = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ContentId) -> Option<&InteractionState> {
        self.entries.get(id)
    }

    pub fn phase(&self, id: &ContentId) -> Option<ItemPhase> {
        self.entries.get(id).map(InteractionState::phase)
    }

    /// Drop the record once the content is no longer observable
    pub fn release(&mut self, id: &ContentId) -> Option<InteractionState> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hidden_count(&self) -> usize {
        self.entries.values().filter(|s| s.is_hidden).count()
    }
}
