//! Request/response messages exchanged with the filter service
//!
//! One JSON object per request, one per response. Every request kind is a
//! variant of a closed enum, so adding a kind forces every handler to deal
//! with it.
//!
//! ```json
//! {"id":"…","request":{"action":"predict","payload":{"id":"post-1","text":"…"}}}
//! {"id":"…","response":{"status":"prediction","data":{"result":{…},"hide":false}}}
//! ```

use crate::types::{ContentId, ContentItem, PredictionResult, Settings};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actions the filter service accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum FilterRequest {
    /// Persist a user's rating on an item and retrain
    SaveRating { item: ContentItem },

    /// Predict for an item by ID and text
    Predict { id: ContentId, text: String },

    /// Read current filter settings
    GetSettings,

    /// Replace filter settings
    UpdateSettings { settings: Settings },
}

impl FilterRequest {
    /// Wire name of the action, for logging
    pub fn action(&self) -> &'static str {
        match self {
            FilterRequest::SaveRating { .. } => "saveRating",
            FilterRequest::Predict { .. } => "predict",
            FilterRequest::GetSettings => "getSettings",
            FilterRequest::UpdateSettings { .. } => "updateSettings",
        }
    }
}

/// Replies from the filter service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "camelCase")]
pub enum FilterResponse {
    /// Rating stored; `trained` reports whether the model is now ready
    Rated {
        trained: bool,
        #[serde(rename = "ratedCount")]
        rated_count: usize,
    },

    /// Prediction plus the hide decision under the current settings
    Prediction { result: PredictionResult, hide: bool },

    /// Current (or just updated) settings
    Settings { settings: Settings },

    /// The request failed; nothing was applied
    Error { message: String },
}

impl FilterResponse {
    pub fn error(message: impl Into<String>) -> Self {
        FilterResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FilterResponse::Error { .. })
    }
}

/// A request tagged with a correlation ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: Uuid,
    pub request: FilterRequest,
}

impl RequestEnvelope {
    pub fn new(request: FilterRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
        }
    }
}

/// A response carrying the ID of the request it answers
///
/// Requests that could not be parsed are answered with the nil UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: Uuid,
    pub response: FilterResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = FilterRequest::Predict {
            id: ContentId::from("post-9"),
            text: "hello".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"action": "predict", "payload": {"id": "post-9", "text": "hello"}})
        );

        let get: FilterRequest = serde_json::from_value(json!({"action": "getSettings"})).unwrap();
        assert_eq!(get, FilterRequest::GetSettings);
    }

    #[test]
    fn test_save_rating_parses_signed_rating() {
        let value = json!({
            "action": "saveRating",
            "payload": {"item": {
                "id": "p1",
                "author": "dora",
                "text": "meh",
                "rating": {"value": -1, "ratedAt": "2026-01-01T00:00:00Z"}
            }}
        });
        let request: FilterRequest = serde_json::from_value(value).unwrap();
        match request {
            FilterRequest::SaveRating { item } => {
                assert_eq!(item.rating_value(), Some(crate::types::Rating::Dislike));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<FilterRequest, _> =
            serde_json::from_value(json!({"action": "deleteEverything"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let response = FilterResponse::Rated {
            trained: true,
            rated_count: 12,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "rated", "data": {"trained": true, "ratedCount": 12}})
        );

        let error = FilterResponse::error("store unavailable");
        assert!(error.is_error());
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"status": "error", "data": {"message": "store unavailable"}})
        );
    }

    #[test]
    fn test_action_names_match_wire() {
        let requests = vec![
            FilterRequest::SaveRating {
                item: ContentItem::new("a", "b", "c"),
            },
            FilterRequest::Predict {
                id: ContentId::from("a"),
                text: String::new(),
            },
            FilterRequest::GetSettings,
            FilterRequest::UpdateSettings {
                settings: Settings::default(),
            },
        ];
        for request in requests {
            let value = serde_json::to_value(&request).unwrap();
            assert_eq!(value["action"], request.action());
        }
    }
}
