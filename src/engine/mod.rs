//! Decision engine: turns content items into show/hide decisions.
//!
//! The engine is an explicitly owned object holding the only mutable state of
//! the filter: the live preference model and the interaction ledger. Share it
//! by reference or `Arc`; there is no global instance.
//!
//! # Decision flow
//!
//! 1. A stored user rating short-circuits everything (confidence 1.0).
//! 2. Otherwise a trained model answers with label + confidence.
//! 3. Otherwise the lexicon fallback attaches a sentiment, with no label.
//!
//! `should_hide` then hides only confident dislikes, strictly above the
//! configured threshold, and only while the filter is enabled.
//!
//! # Concurrency
//!
//! Training builds the new vocabularies under a read lock and swaps them in
//! under a short write lock, so a concurrent `predict` sees either the old
//! or the new model, never a half-cleared one. Training runs themselves are
//! serialized, so the last `train` call to start is the last to install.

pub mod ledger;

pub use ledger::{InteractionLedger, InteractionState, ItemPhase};

use crate::classifier::{sentiment, Prediction, PreferenceModel, VocabularySizes};
use crate::config::ModelConfig;
use crate::types::{ContentId, ContentItem, Label, PredictionResult, Rating, Settings};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Number of top terms per label reported in a model summary
const SUMMARY_TOP_TERMS: usize = 5;

/// Result of evaluating one observed content item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub result: PredictionResult,
    pub hide: bool,
    /// True the first time this content ID reached the engine
    pub first_sighting: bool,
}

/// Read-only snapshot of the model for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub ready: bool,
    pub min_training_examples: usize,
    pub vocabulary: VocabularySizes,
    pub top_liked: Vec<(String, u64)>,
    pub top_disliked: Vec<(String, u64)>,
}

/// Whether a prediction should hide its content under `settings`.
///
/// All of: filter enabled, label is dislike, confidence is a finite number,
/// and confidence strictly greater than `threshold / 100`.
pub fn should_hide(result: &PredictionResult, settings: &Settings) -> bool {
    settings.filter_enabled
        && result.label == Some(Label::Dislike)
        && result.confidence.is_finite()
        && result.confidence > settings.threshold_fraction()
}

/// Preference learning and decision engine
pub struct DecisionEngine {
    model: RwLock<PreferenceModel>,
    /// Held across build and install
    training: Mutex<()>,
    ledger: Mutex<InteractionLedger>,
    corpus_changed: AtomicBool,
}

impl DecisionEngine {
    pub fn new(min_training_examples: usize) -> Self {
        Self {
            model: RwLock::new(PreferenceModel::new(min_training_examples)),
            training: Mutex::new(()),
            ledger: Mutex::new(InteractionLedger::new()),
            corpus_changed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.min_training_examples)
    }

    /// Full retrain from every rated item. Returns whether the model is now trained.
    pub fn train<'a, I>(&self, labeled: I) -> bool
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        let _training = self.training.lock();
        self.corpus_changed.store(false, Ordering::SeqCst);

        let built = self.model.read().build(labeled);
        match built {
            Some(counts) => {
                let mut model = self.model.write();
                model.install(counts);
                let sizes = model.vocabulary_sizes();
                info!(
                    "Preference model trained: {} liked terms, {} disliked terms",
                    sizes.liked, sizes.disliked
                );
                true
            }
            None => {
                let mut model = self.model.write();
                if model.is_ready() {
                    info!("Rated corpus fell below the training minimum, model reverted to untrained");
                }
                model.mark_untrained();
                false
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.read().is_ready()
    }

    /// Raw model prediction, ignoring any stored rating
    pub fn predict(&self, text: &str) -> Prediction {
        self.model.read().predict(text)
    }

    /// A user's rating if present, else the model, else the lexicon fallback
    pub fn get_rating_or_prediction(&self, item: &ContentItem) -> PredictionResult {
        if let Some(rating) = item.rating_value() {
            debug!("Using stored rating for {}", item.id);
            return PredictionResult::from_rating(rating);
        }

        let model = self.model.read();
        if model.is_ready() {
            let prediction = model.predict(&item.text);
            return PredictionResult {
                label: prediction.label,
                confidence: prediction.confidence,
                sentiment: None,
                is_user_rated: false,
            };
        }
        drop(model);

        PredictionResult::from_sentiment(sentiment(&item.text))
    }

    /// See [`should_hide`]
    pub fn should_hide(&self, result: &PredictionResult, settings: &Settings) -> bool {
        should_hide(result, settings)
    }

    /// Overwrite the item's rating, stamp it now, and flag the rated corpus
    /// as changed. Retraining is left to the caller.
    pub fn record_rating(&self, item: &mut ContentItem, rating: Rating) {
        item.set_rating(rating, Utc::now());
        self.corpus_changed.store(true, Ordering::SeqCst);
        debug!("Recorded {} rating for {}", rating, item.id);
    }

    /// Whether a rating was recorded since the last `train`
    pub fn corpus_changed(&self) -> bool {
        self.corpus_changed.load(Ordering::SeqCst)
    }

    /// Observe an item, compute its result and hide decision, and refresh
    /// its ledger record. Safe to call any number of times per item.
    pub fn evaluate(&self, item: &ContentItem, settings: &Settings) -> Evaluation {
        let result = self.get_rating_or_prediction(item);
        let hide = should_hide(&result, settings);

        let mut ledger = self.ledger.lock();
        let first_sighting = ledger.observe(&item.id);
        ledger.refresh(&item.id, &result);

        Evaluation {
            result,
            hide,
            first_sighting,
        }
    }

    /// Re-derive the result for an already tracked item, e.g. after the user
    /// rated it. Untracked items are left alone; returns whether one was updated.
    pub fn refresh(&self, item: &ContentItem) -> bool {
        let result = self.get_rating_or_prediction(item);
        self.ledger.lock().refresh(&item.id, &result)
    }

    pub fn mark_buttons(&self, id: &ContentId) -> bool {
        self.ledger.lock().mark_buttons(id)
    }

    pub fn set_hidden(&self, id: &ContentId, hidden: bool) -> bool {
        self.ledger.lock().set_hidden(id, hidden)
    }

    pub fn interaction(&self, id: &ContentId) -> Option<InteractionState> {
        self.ledger.lock().get(id).cloned()
    }

    /// Forget an item that is no longer observable
    pub fn release(&self, id: &ContentId) -> Option<InteractionState> {
        self.ledger.lock().release(id)
    }

    pub fn tracked_items(&self) -> usize {
        self.ledger.lock().len()
    }

    pub fn hidden_items(&self) -> usize {
        self.ledger.lock().hidden_count()
    }

    pub fn model_summary(&self) -> ModelSummary {
        let model = self.model.read();
        ModelSummary {
            ready: model.is_ready(),
            min_training_examples: model.min_training_examples(),
            vocabulary: model.vocabulary_sizes(),
            top_liked: model.top_terms(Label::Like, SUMMARY_TOP_TERMS),
            top_disliked: model.top_terms(Label::Dislike, SUMMARY_TOP_TERMS),
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sentiment;

    fn rated(id: &str, text: &str, rating: Rating) -> ContentItem {
        let mut item = ContentItem::new(id, "author", text);
        item.set_rating(rating, Utc::now());
        item
    }

    fn corpus() -> Vec<ContentItem> {
        let mut items: Vec<ContentItem> = (0..6)
            .map(|i| rated(&format!("l{}", i), "great thread", Rating::Like))
            .collect();
        items.extend((0..4).map(|i| rated(&format!("d{}", i), "bad crypto shill", Rating::Dislike)));
        items
    }

    fn enabled(threshold: u8) -> Settings {
        Settings {
            filter_enabled: true,
            filter_threshold: threshold,
        }
    }

    fn dislike(confidence: f64) -> PredictionResult {
        PredictionResult {
            label: Some(Label::Dislike),
            confidence,
            sentiment: None,
            is_user_rated: false,
        }
    }

    #[test]
    fn test_fallback_when_untrained() {
        let engine = DecisionEngine::new(5);
        let item = ContentItem::new("p", "a", "I love this, amazing");

        let result = engine.get_rating_or_prediction(&item);
        assert_eq!(result.label, None);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.sentiment, Some(Sentiment::Positive));
        assert!(!result.is_user_rated);
    }

    #[test]
    fn test_model_result_has_no_sentiment() {
        let engine = DecisionEngine::new(5);
        assert!(engine.train(&corpus()));

        let result = engine.get_rating_or_prediction(&ContentItem::new("p", "a", "bad shill"));
        assert_eq!(result.label, Some(Label::Dislike));
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.sentiment, None);
    }

    #[test]
    fn test_user_rating_overrides_model() {
        let engine = DecisionEngine::new(5);
        engine.train(&corpus());

        // The model would call this a dislike
        let mut item = ContentItem::new("p", "a", "bad crypto shill");
        engine.record_rating(&mut item, Rating::Like);

        let result = engine.get_rating_or_prediction(&item);
        assert_eq!(result, PredictionResult::from_rating(Rating::Like));
    }

    #[test]
    fn test_record_rating_flags_corpus() {
        let engine = DecisionEngine::new(1);
        assert!(!engine.corpus_changed());

        let mut item = ContentItem::new("p", "a", "text here");
        engine.record_rating(&mut item, Rating::Dislike);
        assert!(engine.corpus_changed());
        assert!(item.rating.is_some());

        engine.train(std::iter::once(&item));
        assert!(!engine.corpus_changed());
        assert!(engine.is_ready());
    }

    #[test]
    fn test_should_hide_threshold_boundary() {
        let settings = enabled(50);
        assert!(!should_hide(&dislike(0.5), &settings));
        assert!(should_hide(&dislike(0.51), &settings));

        let one_ulp_above = f64::from_bits(0.5f64.to_bits() + 1);
        assert!(should_hide(&dislike(one_ulp_above), &settings));
    }

    #[test]
    fn test_should_hide_requires_enabled_dislike() {
        let disabled = Settings {
            filter_enabled: false,
            filter_threshold: 0,
        };
        assert!(!should_hide(&dislike(1.0), &disabled));

        let like = PredictionResult {
            label: Some(Label::Like),
            ..dislike(1.0)
        };
        assert!(!should_hide(&like, &enabled(0)));
        assert!(!should_hide(&PredictionResult::none(), &enabled(0)));
        assert!(!should_hide(&dislike(f64::NAN), &enabled(0)));
    }

    #[test]
    fn test_user_dislike_hidden_unless_threshold_100() {
        let result = PredictionResult::from_rating(Rating::Dislike);
        assert!(should_hide(&result, &enabled(99)));
        assert!(!should_hide(&result, &enabled(100)));
    }

    #[test]
    fn test_evaluate_tracks_ledger() {
        let engine = DecisionEngine::new(5);
        engine.train(&corpus());
        let item = ContentItem::new("p1", "a", "bad crypto");

        let first = engine.evaluate(&item, &enabled(60));
        assert!(first.first_sighting);
        assert!(first.hide);

        let again = engine.evaluate(&item, &enabled(60));
        assert!(!again.first_sighting);
        assert_eq!(again.result, first.result);

        let state = engine.interaction(&item.id).unwrap();
        assert_eq!(state.sightings, 2);
        assert_eq!(state.prediction, Some(Label::Dislike));
        // Hide decisions are reported, not applied
        assert!(!state.is_hidden);
        assert_eq!(engine.tracked_items(), 1);
    }

    #[test]
    fn test_refresh_after_rating_switches_to_user_result() {
        let engine = DecisionEngine::new(5);
        engine.train(&corpus());
        let mut item = ContentItem::new("p1", "a", "bad crypto");
        engine.evaluate(&item, &enabled(60));
        assert_eq!(engine.interaction(&item.id).unwrap().phase(), ItemPhase::Predicted);

        engine.record_rating(&mut item, Rating::Like);
        assert!(engine.refresh(&item));

        let state = engine.interaction(&item.id).unwrap();
        assert!(state.is_user_rated);
        assert_eq!(state.prediction, Some(Label::Like));
        assert_eq!(state.confidence, Some(1.0));
        assert_eq!(state.sightings, 1);
        assert_eq!(state.phase(), ItemPhase::RatedByUser);

        // Untracked items are not created by a refresh
        assert!(!engine.refresh(&ContentItem::new("other", "a", "bad")));
        assert_eq!(engine.tracked_items(), 1);
    }

    #[test]
    fn test_concurrent_training_installs_a_complete_corpus() {
        let engine = std::sync::Arc::new(DecisionEngine::new(1));
        let full = corpus();
        let liked_only: Vec<ContentItem> = full[..6].to_vec();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                let items = if i % 2 == 0 { full.clone() } else { liked_only.clone() };
                std::thread::spawn(move || engine.train(&items))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let sizes = engine.model_summary().vocabulary;
        assert_eq!(sizes.liked, 2);
        assert!(sizes.disliked == 0 || sizes.disliked == 3);
    }

    #[test]
    fn test_model_summary() {
        let engine = DecisionEngine::new(5);
        assert!(!engine.model_summary().ready);

        engine.train(&corpus());
        let summary = engine.model_summary();
        assert!(summary.ready);
        assert_eq!(summary.top_liked[0], ("great".to_string(), 6));
        assert_eq!(summary.vocabulary.disliked, 3);
    }
}
