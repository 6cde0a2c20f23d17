//! Core data types for the Feedsift relevance filter
//!
//! This module defines the values that flow between the content source, the
//! preference store, the classifier and the decision engine: content items,
//! user ratings, prediction results and filter settings.

use crate::error::FeedsiftError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable opaque identifier for a piece of feed content
///
/// The content source guarantees the same logical post is always reported
/// with the same ID, no matter how often it is re-observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's judgment on a content item
///
/// Serialized as the signed integer `1` or `-1`; any other value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    /// Signed value of the rating (+1 / -1)
    pub fn value(self) -> i8 {
        match self {
            Rating::Like => 1,
            Rating::Dislike => -1,
        }
    }

    /// Label a rating corresponds to
    pub fn label(self) -> Label {
        match self {
            Rating::Like => Label::Like,
            Rating::Dislike => Label::Dislike,
        }
    }
}

impl TryFrom<i8> for Rating {
    type Error = FeedsiftError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Like),
            -1 => Ok(Rating::Dislike),
            other => Err(FeedsiftError::InvalidRating(format!(
                "expected 1 or -1, got {}",
                other
            ))),
        }
    }
}

impl From<Rating> for i8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Like => write!(f, "like"),
            Rating::Dislike => write!(f, "dislike"),
        }
    }
}

/// A rating together with the moment it was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub value: Rating,
    pub rated_at: DateTime<Utc>,
}

/// A single unit of feed content
///
/// Identity is the `id`; `author`, `text` and `discovered_at` are fixed once
/// extracted. `rating` is either absent or holds exactly one (the latest)
/// user judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ContentId,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub text: String,

    /// When the content source first extracted this item
    #[serde(default = "Utc::now")]
    pub discovered_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<UserRating>,
}

impl ContentItem {
    /// Create an unrated item discovered now
    pub fn new(id: impl Into<ContentId>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            text: text.into(),
            discovered_at: Utc::now(),
            rating: None,
        }
    }

    /// Builder-style setter for a known discovery time
    pub fn discovered_at(mut self, at: DateTime<Utc>) -> Self {
        self.discovered_at = at;
        self
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    /// Current rating value, if any
    pub fn rating_value(&self) -> Option<Rating> {
        self.rating.map(|r| r.value)
    }

    /// Replace any previous rating with `rating` stamped at `at`
    pub fn set_rating(&mut self, rating: Rating, at: DateTime<Utc>) {
        self.rating = Some(UserRating {
            value: rating,
            rated_at: at,
        });
    }
}

/// Actionable prediction label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Like,
    Dislike,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Like => write!(f, "like"),
            Label::Dislike => write!(f, "dislike"),
        }
    }
}

/// Polarity produced by the lexicon fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Outcome of asking the engine about one content item
///
/// `label == None` means "no actionable prediction"; callers show the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub label: Option<Label>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    pub is_user_rated: bool,
}

impl PredictionResult {
    /// No signal at all: `{none, 0}`
    pub fn none() -> Self {
        Self {
            label: None,
            confidence: 0.0,
            sentiment: None,
            is_user_rated: false,
        }
    }

    /// A stored user rating, which always carries full confidence
    pub fn from_rating(rating: Rating) -> Self {
        Self {
            label: Some(rating.label()),
            confidence: 1.0,
            sentiment: None,
            is_user_rated: true,
        }
    }

    /// Untrained-model answer carrying only the lexicon sentiment
    pub fn from_sentiment(sentiment: Sentiment) -> Self {
        Self {
            sentiment: Some(sentiment),
            ..Self::none()
        }
    }
}

/// Highest accepted filter threshold, in percent
pub const MAX_THRESHOLD: u8 = 100;

/// User-configured filter settings
///
/// Owned by the preference store and passed in per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub filter_enabled: bool,

    /// Confidence percentage a dislike must strictly exceed to hide a post
    pub filter_threshold: u8,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.filter_threshold > MAX_THRESHOLD {
            return Err(FeedsiftError::InvalidSettings(format!(
                "filterThreshold must be within 0..={}, got {}",
                MAX_THRESHOLD, self.filter_threshold
            )));
        }
        Ok(())
    }

    /// Threshold as a fraction in [0, 1]
    pub fn threshold_fraction(&self) -> f64 {
        f64::from(self.filter_threshold) / 100.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter_enabled: false,
            filter_threshold: 70,
        }
    }
}
