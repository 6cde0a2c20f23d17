//! Filter service on a SQLite store, across reopen

mod common;

use common::great_bad_corpus;
use feedsift_core::{
    config::TrainingConfig, ContentId, DecisionEngine, FilterRequest, FilterResponse,
    FilterService, Label, PreferenceStore, Rating, Settings, SqliteStore,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn open(path: &Path, min: usize) -> FilterService {
    let store = SqliteStore::open(path).await.unwrap();
    FilterService::new(
        Arc::new(DecisionEngine::new(min)),
        Arc::new(store),
        &TrainingConfig {
            retrain_on_rating: false,
        },
    )
}

#[tokio::test]
async fn test_ratings_and_settings_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested").join("feedsift.db");

    {
        let service = open(&db, 10).await;
        for item in great_bad_corpus() {
            let response = service.handle(FilterRequest::SaveRating { item }).await;
            assert!(!response.is_error(), "{:?}", response);
        }
        let settings = Settings {
            filter_enabled: true,
            filter_threshold: 55,
        };
        service
            .handle(FilterRequest::UpdateSettings { settings })
            .await;
        assert!(!service.engine().is_ready());
    }

    let service = open(&db, 10).await;
    let outcome = service.retrain().await.unwrap();
    assert!(outcome.trained);
    assert_eq!(outcome.rated_count, 10);

    let response = service
        .handle(FilterRequest::Predict {
            id: ContentId::from("fresh"),
            text: "so bad".to_string(),
        })
        .await;
    match response {
        FilterResponse::Prediction { result, hide } => {
            assert_eq!(result.label, Some(Label::Dislike));
            assert!(hide);
        }
        other => panic!("unexpected response {:?}", other),
    }

    let status = service.status().await.unwrap();
    assert_eq!(status.store.rated, 10);
    assert!(status.model.ready);
    assert!(!status.pending_retrain);
}

#[tokio::test]
async fn test_rerating_keeps_first_extraction() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("feedsift.db");
    let store = Arc::new(SqliteStore::open(&db).await.unwrap());
    let service = FilterService::new(
        Arc::new(DecisionEngine::new(1)),
        store.clone(),
        &TrainingConfig::default(),
    );

    let first = common::rated_item("p", "original words", Rating::Like);
    service.handle(FilterRequest::SaveRating { item: first }).await;
    let again = common::rated_item("p", "edited words", Rating::Dislike);
    service.handle(FilterRequest::SaveRating { item: again }).await;

    let stored = store.get(&ContentId::from("p")).await.unwrap().unwrap();
    assert_eq!(stored.text, "original words");
    assert_eq!(stored.rating_value(), Some(Rating::Dislike));
    assert_eq!(store.count().await.unwrap().items, 1);
}
