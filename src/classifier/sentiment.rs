//! Fixed-lexicon polarity scoring.
//!
//! Only consulted while the preference model is untrained, so the user sees
//! some signal before enough ratings exist. Deliberately cruder than the
//! tokenizer: whitespace split, case folding, nothing else. A word with
//! trailing punctuation ("terrible!") does not match.

use crate::types::Sentiment;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Positive lexicon
pub fn positive_words() -> &'static HashSet<&'static str> {
    static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        [
            "good",
            "great",
            "awesome",
            "amazing",
            "excellent",
            "love",
            "loved",
            "like",
            "happy",
            "best",
            "wonderful",
            "fantastic",
            "nice",
            "beautiful",
            "brilliant",
            "fun",
        ]
        .iter()
        .copied()
        .collect()
    });
    &SET
}

/// Negative lexicon
pub fn negative_words() -> &'static HashSet<&'static str> {
    static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        [
            "bad",
            "terrible",
            "awful",
            "horrible",
            "hate",
            "hated",
            "worst",
            "poor",
            "sad",
            "angry",
            "boring",
            "ugly",
            "stupid",
            "disappointing",
            "annoying",
            "gross",
        ]
        .iter()
        .copied()
        .collect()
    });
    &SET
}

/// Score `text` against the fixed lexicons.
pub fn sentiment(text: &str) -> Sentiment {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in text.split_whitespace() {
        let word = word.to_lowercase();
        if positive_words().contains(word.as_str()) {
            positive += 1;
        } else if negative_words().contains(word.as_str()) {
            negative += 1;
        }
    }

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        assert_eq!(sentiment("I love this, amazing"), Sentiment::Positive);
    }

    #[test]
    fn test_negative_text() {
        assert_eq!(sentiment("I hate this, terrible"), Sentiment::Negative);
    }

    #[test]
    fn test_neutral_text() {
        assert_eq!(sentiment("the sky is blue"), Sentiment::Neutral);
        assert_eq!(sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn test_tie_is_neutral() {
        assert_eq!(sentiment("good food, bad service"), Sentiment::Neutral);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sentiment("AWESOME Great"), Sentiment::Positive);
    }

    #[test]
    fn test_punctuation_not_stripped() {
        // "terrible!" is not in the lexicon; only "great" counts
        assert_eq!(sentiment("terrible! but great"), Sentiment::Positive);
    }
}
