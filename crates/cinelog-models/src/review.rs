use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{MovieId, ReviewId, UserId};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    pub movie_id: MovieId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>, // Present when the server populates the author
    pub rating: u8, // 1-5
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub helpful_votes: u32,
    /// Set on the local projection of a review that the server has not confirmed yet
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl Review {
    pub fn is_valid_rating(rating: u8) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&rating)
    }
}

/// Partial review update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_text: Option<String>,
}

impl ReviewEdit {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.review_text.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(!Review::is_valid_rating(0));
        assert!(Review::is_valid_rating(1));
        assert!(Review::is_valid_rating(5));
        assert!(!Review::is_valid_rating(6));
    }

    #[test]
    fn test_pending_flag_not_serialized_when_false() {
        let review = Review {
            id: "r1".to_string(),
            movie_id: "m1".to_string(),
            user_id: "u1".to_string(),
            username: None,
            rating: 4,
            review_text: "Great".to_string(),
            created_at: Utc::now(),
            helpful_votes: 0,
            pending: false,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("pending").is_none());
        assert_eq!(json["reviewText"], "Great");
    }

    #[test]
    fn test_review_edit_is_empty() {
        assert!(ReviewEdit::default().is_empty());
        let edit = ReviewEdit { rating: Some(3), review_text: None };
        assert!(!edit.is_empty());
    }
}
