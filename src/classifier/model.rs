//! Frequency-based bag-of-terms preference model.
//!
//! Two term→count vocabularies are aggregated from every rated item: terms
//! from liked items go to `liked`, terms from disliked items to `disliked`.
//! Training is a full rebuild, so the result depends only on the multiset of
//! rated items, never on their order or on earlier model state.
//!
//! # Prediction
//!
//! For an input text, every term contributes its `liked` count to the like
//! score and its `disliked` count to the dislike score (absent terms add 0,
//! no smoothing). The winning side's share of the total is the confidence.
//! Like must be strictly greater to win; an exact tie goes to dislike.

use crate::classifier::tokenizer::tokenize;
use crate::types::{ContentItem, Label, Rating};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Default number of rated items required before the model will predict
pub const DEFAULT_MIN_TRAINING_EXAMPLES: usize = 5;

/// Raw label + confidence straight from the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Option<Label>,
    pub confidence: f64,
}

impl Prediction {
    pub fn none() -> Self {
        Self {
            label: None,
            confidence: 0.0,
        }
    }
}

/// The two term vocabularies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermCounts {
    liked: HashMap<String, u64>,
    disliked: HashMap<String, u64>,
}

impl TermCounts {
    /// Aggregate term counts from rated items. Unrated items are ignored.
    pub fn from_rated<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        let mut counts = Self::default();
        for item in items {
            let Some(rating) = item.rating_value() else {
                continue;
            };
            let target = match rating {
                Rating::Like => &mut counts.liked,
                Rating::Dislike => &mut counts.disliked,
            };
            for term in tokenize(&item.text) {
                *target.entry(term).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn liked(&self, term: &str) -> u64 {
        self.liked.get(term).copied().unwrap_or(0)
    }

    pub fn disliked(&self, term: &str) -> u64 {
        self.disliked.get(term).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty()
    }

    fn vocabulary(&self, label: Label) -> &HashMap<String, u64> {
        match label {
            Label::Like => &self.liked,
            Label::Dislike => &self.disliked,
        }
    }
}

/// Vocabulary sizes reported by `PreferenceModel::vocabulary_sizes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularySizes {
    pub liked: usize,
    pub disliked: usize,
}

/// Bag-of-terms classifier trained from a user's ratings
#[derive(Debug, Clone)]
pub struct PreferenceModel {
    counts: TermCounts,
    trained: bool,
    min_training_examples: usize,
}

impl PreferenceModel {
    /// Create an untrained model. `min_training_examples` is clamped to at least 1.
    pub fn new(min_training_examples: usize) -> Self {
        Self {
            counts: TermCounts::default(),
            trained: false,
            min_training_examples: min_training_examples.max(1),
        }
    }

    pub fn min_training_examples(&self) -> usize {
        self.min_training_examples
    }

    /// Whether the model may emit labels
    pub fn is_ready(&self) -> bool {
        self.trained
    }

    pub fn counts(&self) -> &TermCounts {
        &self.counts
    }

    /// Build fresh vocabularies from `labeled`, or `None` if there are too
    /// few rated items. Does not touch `self`.
    pub fn build<'a, I>(&self, labeled: I) -> Option<TermCounts>
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        let rated: Vec<&ContentItem> = labeled.into_iter().filter(|i| i.is_rated()).collect();
        if rated.len() < self.min_training_examples {
            debug!(
                "Not enough rated items to train: {} < {}",
                rated.len(),
                self.min_training_examples
            );
            return None;
        }
        Some(TermCounts::from_rated(rated))
    }

    /// Replace both vocabularies wholesale and mark the model trained
    pub fn install(&mut self, counts: TermCounts) {
        self.counts = counts;
        self.trained = true;
    }

    /// Drop to untrained while keeping the existing vocabularies untouched
    pub fn mark_untrained(&mut self) {
        self.trained = false;
    }

    /// Full retrain from every rated item.
    ///
    /// Returns `false` (and leaves the vocabularies unchanged, but untrained)
    /// when fewer than `min_training_examples` rated items are supplied.
    pub fn train<'a, I>(&mut self, labeled: I) -> bool
    where
        I: IntoIterator<Item = &'a ContentItem>,
    {
        match self.build(labeled) {
            Some(counts) => {
                self.install(counts);
                true
            }
            None => {
                self.mark_untrained();
                false
            }
        }
    }

    /// Predict a label and confidence for unlabeled text
    pub fn predict(&self, text: &str) -> Prediction {
        if !self.trained {
            return Prediction::none();
        }

        let terms = tokenize(text);
        if terms.is_empty() {
            return Prediction::none();
        }

        let (like_score, dislike_score) = terms.iter().fold((0u64, 0u64), |(l, d), term| {
            (l + self.counts.liked(term), d + self.counts.disliked(term))
        });

        let total = like_score + dislike_score;
        if total == 0 {
            return Prediction::none();
        }

        let like_confidence = like_score as f64 / total as f64;
        let dislike_confidence = dislike_score as f64 / total as f64;

        if like_confidence > dislike_confidence {
            Prediction {
                label: Some(Label::Like),
                confidence: like_confidence,
            }
        } else {
            Prediction {
                label: Some(Label::Dislike),
                confidence: dislike_confidence,
            }
        }
    }

    pub fn vocabulary_sizes(&self) -> VocabularySizes {
        VocabularySizes {
            liked: self.counts.liked.len(),
            disliked: self.counts.disliked.len(),
        }
    }

    /// Most frequent terms for a label, highest count first, ties by term
    pub fn top_terms(&self, label: Label, n: usize) -> Vec<(String, u64)> {
        let mut terms: Vec<(String, u64)> = self
            .counts
            .vocabulary(label)
            .iter()
            .map(|(term, count)| (term.clone(), *count))
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        terms.truncate(n);
        terms
    }
}

impl Default for PreferenceModel {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TRAINING_EXAMPLES)
    }
}
