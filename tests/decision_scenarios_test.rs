//! End-to-end decision scenarios for the preference engine
//!
//! Covers training on a small corpus, fallback sentiment, threshold
//! boundaries and user-rating overrides.

mod common;

use common::{great_bad_corpus, rated_item};
use feedsift_core::{
    should_hide, ContentItem, DecisionEngine, Label, PredictionResult, Rating, Sentiment, Settings,
};

fn filter_at(threshold: u8) -> Settings {
    Settings {
        filter_enabled: true,
        filter_threshold: threshold,
    }
}

#[test]
fn test_trained_model_predicts_like_for_known_vocabulary() {
    let engine = DecisionEngine::new(10);
    assert!(engine.train(&great_bad_corpus()));

    let prediction = engine.predict("this is great");
    assert_eq!(prediction.label, Some(Label::Like));
    assert_eq!(prediction.confidence, 1.0);
}

#[test]
fn test_unrelated_text_has_no_prediction() {
    let engine = DecisionEngine::new(10);
    engine.train(&great_bad_corpus());

    let result =
        engine.get_rating_or_prediction(&ContentItem::new("x", "y", "completely unrelated filler text"));
    assert_eq!(result, PredictionResult::none());
    assert!(!should_hide(&result, &filter_at(0)));
}

#[test]
fn test_threshold_is_strict() {
    let settings = filter_at(50);
    let at = PredictionResult {
        label: Some(Label::Dislike),
        confidence: 0.5,
        sentiment: None,
        is_user_rated: false,
    };
    let above = PredictionResult {
        confidence: 0.51,
        ..at
    };

    assert!(!should_hide(&at, &settings));
    assert!(should_hide(&above, &settings));
}

#[test]
fn test_stored_rating_beats_model() {
    let engine = DecisionEngine::new(10);
    engine.train(&great_bad_corpus());

    // Text the model would call a dislike, but the user liked it
    let item = rated_item("mine", "bad clickbait headline", Rating::Like);
    let result = engine.get_rating_or_prediction(&item);

    assert_eq!(result.label, Some(Label::Like));
    assert_eq!(result.confidence, 1.0);
    assert!(result.is_user_rated);
}

#[test]
fn test_stored_rating_beats_untrained_fallback() {
    let engine = DecisionEngine::new(10);
    let item = rated_item("mine", "I hate this, terrible", Rating::Like);

    let result = engine.get_rating_or_prediction(&item);
    assert_eq!(result, PredictionResult::from_rating(Rating::Like));
    assert_eq!(result.sentiment, None);
}

#[test]
fn test_fallback_sentiment_while_untrained() {
    let engine = DecisionEngine::new(10);
    let cases = [
        ("I love this, amazing", Sentiment::Positive),
        ("I hate this, terrible", Sentiment::Negative),
        ("the sky is blue", Sentiment::Neutral),
    ];

    for (text, expected) in cases {
        let result = engine.get_rating_or_prediction(&ContentItem::new("p", "a", text));
        assert_eq!(result.label, None, "{}", text);
        assert_eq!(result.confidence, 0.0, "{}", text);
        assert_eq!(result.sentiment, Some(expected), "{}", text);
        assert!(!should_hide(&result, &filter_at(0)));
    }
}

#[test]
fn test_losing_ratings_reverts_to_untrained() {
    let engine = DecisionEngine::new(10);
    let corpus = great_bad_corpus();
    assert!(engine.train(&corpus));
    assert!(engine.is_ready());

    assert!(!engine.train(&corpus[..9]));
    assert!(!engine.is_ready());

    let result = engine.get_rating_or_prediction(&ContentItem::new("p", "a", "great stuff"));
    assert_eq!(result.label, None);
    assert_eq!(result.sentiment, Some(Sentiment::Positive));
}

#[test]
fn test_repeated_observation_is_idempotent() {
    let engine = DecisionEngine::new(10);
    engine.train(&great_bad_corpus());
    let item = ContentItem::new("feed-1", "z", "bad engagement bait");
    let settings = filter_at(70);

    let evaluations: Vec<_> = (0..5).map(|_| engine.evaluate(&item, &settings)).collect();
    assert!(evaluations[0].first_sighting);
    assert!(evaluations[1..].iter().all(|e| !e.first_sighting));
    assert!(evaluations.iter().all(|e| e.hide && e.result == evaluations[0].result));

    assert!(engine.mark_buttons(&item.id));
    assert!(engine.set_hidden(&item.id, true));
    engine.evaluate(&item, &settings);

    let state = engine.interaction(&item.id).unwrap();
    assert!(state.has_buttons);
    assert!(state.is_hidden);
    assert_eq!(state.sightings, 6);
    assert_eq!(engine.tracked_items(), 1);
    assert_eq!(engine.hidden_items(), 1);
}
