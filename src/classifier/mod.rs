//! Preference classifier: tokenizer, learned model and lexicon fallback.
//!
//! - **tokenizer**: raw text to normalized terms
//! - **model**: bag-of-terms counts learned from rated items
//! - **sentiment**: fixed-lexicon polarity used while the model is untrained

pub mod model;
pub mod sentiment;
pub mod tokenizer;

pub use model::{Prediction, PreferenceModel, TermCounts, VocabularySizes, DEFAULT_MIN_TRAINING_EXAMPLES};
pub use sentiment::sentiment;
pub use tokenizer::tokenize;
