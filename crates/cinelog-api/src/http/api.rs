//! Wire shapes of the catalog backend and their conversion into models
//!
//! The backend returns Mongo-style documents: ids under `_id`, and
//! references (`movieId`, `userId`) that are either a bare id or a
//! populated document depending on the endpoint.

use chrono::{DateTime, Utc};
use cinelog_models::{Movie, PageInfo, Review, User, WatchlistItem, WatchlistStats, WatchlistStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Reference<T> {
    Id(String),
    Populated(T),
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentRef {
    #[serde(rename = "_id", alias = "id")]
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorRef {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireReview {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    movie_id: Reference<DocumentRef>,
    user_id: Reference<AuthorRef>,
    rating: u8,
    #[serde(default)]
    review_text: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    helpful_votes: u32,
}

impl From<WireReview> for Review {
    fn from(wire: WireReview) -> Self {
        let movie_id = match wire.movie_id {
            Reference::Id(id) => id,
            Reference::Populated(doc) => doc.id,
        };
        let (user_id, username) = match wire.user_id {
            Reference::Id(id) => (id, None),
            Reference::Populated(author) => (author.id, author.username),
        };
        Review {
            id: wire.id,
            movie_id,
            user_id,
            username,
            rating: wire.rating,
            review_text: wire.review_text,
            created_at: wire.created_at,
            helpful_votes: wire.helpful_votes,
            pending: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireWatchlistItem {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    movie_id: Reference<Movie>,
    status: WatchlistStatus,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl From<WireWatchlistItem> for WatchlistItem {
    fn from(wire: WireWatchlistItem) -> Self {
        let (movie_id, movie) = match wire.movie_id {
            Reference::Id(id) => (id, None),
            Reference::Populated(movie) => (movie.id.clone(), Some(movie)),
        };
        WatchlistItem {
            id: wire.id,
            movie_id,
            movie,
            status: wire.status,
            created_at: wire.created_at,
        }
    }
}

// Response envelopes

#[derive(Debug, Deserialize)]
pub(crate) struct MoviesEnvelope {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MovieEnvelope {
    pub movie: Movie,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsEnvelope {
    #[serde(default)]
    pub reviews: Vec<WireReview>,
    #[serde(default)]
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewEnvelope {
    pub review: WireReview,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HelpfulEnvelope {
    pub helpful_votes: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WatchlistEnvelope {
    #[serde(default)]
    pub watchlist: Vec<WireWatchlistItem>,
    #[serde(default)]
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WatchlistItemEnvelope {
    pub watchlist_item: WireWatchlistItem,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsEnvelope {
    pub stats: WatchlistStats,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthEnvelope {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// Request bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewReviewBody<'a> {
    pub movie_id: &'a str,
    pub rating: u8,
    pub review_text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WatchlistBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<&'a str>,
    pub status: WatchlistStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Pull the `message` field out of an error response, if there is one
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}
