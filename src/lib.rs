//! Feedsift - Personal Relevance Filter for Social Timelines
//!
//! Learns what a user likes from their own post ratings and predicts whether
//! unrated posts will be liked or disliked, so disliked ones can be hidden:
//! - Bag-of-terms preference model rebuilt from every rating
//! - Lexicon sentiment fallback until enough ratings exist
//! - Threshold-based show/hide decisions that always honor the user's own ratings
//! - Idempotent per-post bookkeeping for repeatedly observed content
//!
//! # Architecture
//!
//! - **Types**: Core data structures (ContentItem, Rating, Settings, ...)
//! - **Classifier**: Tokenizer, preference model, sentiment fallback
//! - **Engine**: Decision engine and interaction ledger
//! - **Storage**: Preference store backends (in-memory, SQLite)
//! - **Service / Daemon**: Request handling and the Unix-socket channel
//!
//! # Example
//!
//! ```
//! use feedsift_core::{ContentItem, DecisionEngine, Label, Rating, Settings};
//!
//! let engine = DecisionEngine::new(2);
//!
//! let mut liked = ContentItem::new("1", "ana", "lovely sunset photos");
//! engine.record_rating(&mut liked, Rating::Like);
//! let mut disliked = ContentItem::new("2", "bo", "crypto giveaway scam");
//! engine.record_rating(&mut disliked, Rating::Dislike);
//! assert!(engine.train([&liked, &disliked]));
//!
//! let result = engine.get_rating_or_prediction(&ContentItem::new("3", "cy", "another crypto scam"));
//! assert_eq!(result.label, Some(Label::Dislike));
//!
//! let settings = Settings { filter_enabled: true, filter_threshold: 80 };
//! assert!(engine.should_hide(&result, &settings));
//! ```

pub mod classifier;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod service;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use crate::config::FeedsiftConfig;
pub use classifier::{sentiment, tokenize, Prediction, PreferenceModel};
pub use engine::{should_hide, DecisionEngine, Evaluation, InteractionLedger, ItemPhase};
pub use error::{FeedsiftError, Result};
pub use protocol::{FilterRequest, FilterResponse};
pub use service::FilterService;
pub use storage::{MemoryStore, PreferenceStore, SqliteStore};
pub use types::{
    ContentId, ContentItem, Label, PredictionResult, Rating, Sentiment, Settings, UserRating,
};
