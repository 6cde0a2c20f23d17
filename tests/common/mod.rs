//! Common test utilities and helpers

#![allow(dead_code)]

use chrono::Utc;
use feedsift_core::{ContentItem, Rating};

/// Build an item that already carries `rating`
pub fn rated_item(id: &str, text: &str, rating: Rating) -> ContentItem {
    let mut item = ContentItem::new(id, "tester", text);
    item.set_rating(rating, Utc::now());
    item
}

/// 6 liked posts containing "great", 4 disliked posts containing "bad"
pub fn great_bad_corpus() -> Vec<ContentItem> {
    let liked = [
        "great photo of the harbor",
        "great thread on compilers",
        "what a great match",
        "great recipe thanks",
        "great news for open source",
        "great talk yesterday",
    ];
    let disliked = [
        "bad hot take",
        "bad engagement bait",
        "another bad rumor",
        "bad clickbait headline",
    ];

    let mut items = Vec::new();
    for (i, text) in liked.iter().enumerate() {
        items.push(rated_item(&format!("like-{}", i), text, Rating::Like));
    }
    for (i, text) in disliked.iter().enumerate() {
        items.push(rated_item(&format!("dislike-{}", i), text, Rating::Dislike));
    }
    items
}
