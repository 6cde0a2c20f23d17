//! Text normalization into bag-of-terms input for the preference model.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Anything that is neither a word character nor whitespace.
///
/// `\w` is Unicode-aware, so letters and digits from any script survive while
/// punctuation and symbols are removed.
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("Valid punctuation regex"));

/// Closed stopword list: articles, conjunctions, common prepositions and a
/// handful of copulas/demonstratives that carry no preference signal.
pub fn stopwords() -> &'static HashSet<&'static str> {
    static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        [
            "the", "an", "and", "or", "but", "nor", "so", "yet", "of", "in", "on", "at", "to",
            "for", "with", "by", "from", "as", "into", "about", "over", "is", "are", "was", "were",
            "be", "been", "it", "its", "this", "that",
        ]
        .iter()
        .copied()
        .collect()
    });
    &SET
}

/// Turn raw text into a normalized term sequence.
///
/// Lowercases, strips punctuation, splits on whitespace and drops stopwords
/// and single-character terms. Empty or whitespace-only input yields an empty
/// vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");

    stripped
        .split_whitespace()
        .filter(|term| term.chars().count() > 1)
        .filter(|term| !stopwords().contains(term))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_normalization() {
        let terms = tokenize("The Rust compiler is GREAT, and fast!");
        assert_eq!(terms, vec!["rust", "compiler", "great", "fast"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n  ").is_empty());
        assert!(tokenize("!!! ... ???").is_empty());
    }

    #[test]
    fn test_single_characters_dropped() {
        assert_eq!(tokenize("a b c ok x"), vec!["ok"]);
    }

    #[test]
    fn test_punctuation_joins_rather_than_splits() {
        // Punctuation is removed, not replaced by whitespace
        assert_eq!(tokenize("don't re-post"), vec!["dont", "repost"]);
    }

    #[test]
    fn test_unicode_word_characters_preserved() {
        let terms = tokenize("Café naïve 東京 über_cool 42");
        assert_eq!(terms, vec!["café", "naïve", "東京", "über_cool", "42"]);
    }

    #[test]
    fn test_repeated_terms_kept() {
        assert_eq!(tokenize("great great GREAT"), vec!["great", "great", "great"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Same input, same output: every time.";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
