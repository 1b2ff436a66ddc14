use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// Derived deck summary returned by every deck read endpoint. Built only by
/// the composer; never stored.
#[derive(Debug, Serialize)]
pub struct DeckView {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub privacy: bool,
    pub num_cards: i64,
    pub category: String,
    pub creator: String,
    pub max_score: Option<i32>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Body of POST /decks and PUT /decks/:id.
#[derive(Debug, Deserialize)]
pub struct DeckPayload {
    pub name: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub private: bool,
}

impl DeckPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation(vec![
                "name: must not be empty".to_string()
            ]));
        }
        Ok(())
    }
}

/// Body of POST /decks/:id/cards and PUT /cards/:id.
#[derive(Debug, Deserialize)]
pub struct CardPayload {
    pub front: String,
    pub back: String,
}

impl CardPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.front.trim().is_empty() {
            errors.push("front: must not be empty".to_string());
        }
        if self.back.trim().is_empty() {
            errors.push("back: must not be empty".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errors))
        }
    }
}

/// Body of POST /users/me/decks/:id/scores.
#[derive(Debug, Deserialize)]
pub struct ScorePayload {
    pub hits: i32,
    pub total: i32,
}

impl ScorePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.hits < 0 {
            errors.push("hits: must not be negative".to_string());
        }
        if self.total < self.hits.max(0) {
            errors.push("total: must be at least hits".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// Query string of GET /decks.
#[derive(Debug, Deserialize)]
pub struct DeckSearch {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct MaxScoreResponse {
    pub max_score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_defaults_apply() {
        let search: DeckSearch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(search.q, "");
        assert_eq!(search.limit, 50);
        assert_eq!(search.offset, 0);

        let page: Pagination = serde_json::from_value(json!({ "offset": 100 })).unwrap();
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 100);
    }

    #[test]
    fn deck_payload_rejects_blank_name() {
        let payload = DeckPayload {
            name: "   ".into(),
            category_id: None,
            private: false,
        };
        let err = payload.validate().unwrap_err();
        let ApiError::Validation { errors } = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors, vec!["name: must not be empty".to_string()]);
    }

    #[test]
    fn deck_payload_accepts_named_deck() {
        let payload = DeckPayload {
            name: "Spanish Verbs".into(),
            category_id: Some(Uuid::new_v4()),
            private: false,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn deck_payload_private_defaults_false() {
        let payload: DeckPayload =
            serde_json::from_value(json!({ "name": "Algebra", "category_id": null })).unwrap();
        assert!(!payload.private);
    }

    #[test]
    fn card_payload_collects_both_blank_fields() {
        let payload = CardPayload {
            front: "".into(),
            back: " ".into(),
        };
        let ApiError::Validation { errors } = payload.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("front:"));
        assert!(errors[1].starts_with("back:"));
    }

    #[test]
    fn score_payload_bounds() {
        assert!(ScorePayload { hits: 8, total: 10 }.validate().is_ok());
        assert!(ScorePayload { hits: 0, total: 0 }.validate().is_ok());
        assert!(ScorePayload { hits: -1, total: 5 }.validate().is_err());
        assert!(ScorePayload { hits: 7, total: 5 }.validate().is_err());
    }

    #[test]
    fn max_score_serializes_null_when_absent() {
        let body = serde_json::to_value(MaxScoreResponse { max_score: None }).unwrap();
        assert!(body["max_score"].is_null());
        let body = serde_json::to_value(MaxScoreResponse {
            max_score: Some(9),
        })
        .unwrap();
        assert_eq!(body["max_score"], 9);
    }
}
