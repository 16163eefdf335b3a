//! Bookkeeping for mutations that are waiting on the server
//!
//! A mutation is identified by a [`MutationKey`]. While it is pending the
//! key holds a ticket in the [`PendingSet`] and its local projection sits in
//! the [`OptimisticOverlay`], apart from committed state.

use chrono::Utc;
use cinelog_models::{MovieId, Review, ReviewId, UserId, WatchlistStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use crate::error::DispatchError;

/// Logical target of a mutation; at most one may be pending per key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MutationKey {
    /// Any add, remove or status change for a movie's watchlist entry
    Watchlist(MovieId),
    /// A new review for a movie
    SubmitReview(MovieId),
    /// Edit, delete or helpful vote on an existing review
    Review(ReviewId),
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKey::Watchlist(movie_id) => write!(f, "watchlist entry of movie {}", movie_id),
            MutationKey::SubmitReview(movie_id) => write!(f, "new review of movie {}", movie_id),
            MutationKey::Review(review_id) => write!(f, "review {}", review_id),
        }
    }
}

/// Every intent the coordinator dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FetchMovies,
    FetchMovie,
    FetchFeatured,
    FetchTrending,
    SearchMovies,
    FetchReviews,
    FetchUserReviews,
    FetchMyReviews,
    SubmitReview,
    UpdateReview,
    DeleteReview,
    MarkHelpful,
    FetchWatchlist,
    AddToWatchlist,
    RemoveFromWatchlist,
    UpdateWatchlistStatus,
    ToggleWatchlist,
    FetchWatchlistStats,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FetchMovies => "fetch_movies",
            Operation::FetchMovie => "fetch_movie",
            Operation::FetchFeatured => "fetch_featured",
            Operation::FetchTrending => "fetch_trending",
            Operation::SearchMovies => "search_movies",
            Operation::FetchReviews => "fetch_reviews",
            Operation::FetchUserReviews => "fetch_user_reviews",
            Operation::FetchMyReviews => "fetch_my_reviews",
            Operation::SubmitReview => "submit_review",
            Operation::UpdateReview => "update_review",
            Operation::DeleteReview => "delete_review",
            Operation::MarkHelpful => "mark_helpful",
            Operation::FetchWatchlist => "fetch_watchlist",
            Operation::AddToWatchlist => "add_to_watchlist",
            Operation::RemoveFromWatchlist => "remove_from_watchlist",
            Operation::UpdateWatchlistStatus => "update_watchlist_status",
            Operation::ToggleWatchlist => "toggle_watchlist",
            Operation::FetchWatchlistStats => "fetch_watchlist_stats",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket handed out when a key becomes pending
pub type Ticket = u64;

/// Keys with a mutation in flight
#[derive(Debug, Default)]
pub struct PendingSet {
    in_flight: HashMap<MutationKey, Ticket>,
    // Never reset, so tickets from before a clear can't match new ones
    next_ticket: Ticket,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` pending, or fail with `Busy` if it already is
    pub fn try_begin(&mut self, key: &MutationKey) -> Result<Ticket, DispatchError> {
        if self.in_flight.contains_key(key) {
            return Err(DispatchError::Busy(key.clone()));
        }
        self.next_ticket += 1;
        self.in_flight.insert(key.clone(), self.next_ticket);
        Ok(self.next_ticket)
    }

    /// Release `key` if `ticket` still owns it; returns whether it did
    pub fn finish(&mut self, key: &MutationKey, ticket: Ticket) -> bool {
        if self.in_flight.get(key) == Some(&ticket) {
            self.in_flight.remove(key);
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn keys(&self) -> BTreeSet<MutationKey> {
        self.in_flight.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}

/// Local projections of pending mutations
///
/// `watchlist` maps a movie to its projected status, `None` meaning a
/// pending removal. `reviews` holds placeholder reviews flagged `pending`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimisticOverlay {
    pub watchlist: BTreeMap<MovieId, Option<WatchlistStatus>>,
    pub reviews: Vec<Review>,
}

impl OptimisticOverlay {
    pub fn project_watchlist(&mut self, movie_id: &str, status: Option<WatchlistStatus>) {
        self.watchlist.insert(movie_id.to_string(), status);
    }

    pub fn discard_watchlist(&mut self, movie_id: &str) {
        self.watchlist.remove(movie_id);
    }

    /// Add a placeholder for a review being submitted
    pub fn project_review(
        &mut self,
        ticket: Ticket,
        movie_id: &str,
        user_id: Option<UserId>,
        rating: u8,
        text: &str,
    ) {
        self.reviews.push(Review {
            id: Self::placeholder_id(ticket),
            movie_id: movie_id.to_string(),
            user_id: user_id.unwrap_or_default(),
            username: None,
            rating,
            review_text: text.to_string(),
            created_at: Utc::now(),
            helpful_votes: 0,
            pending: true,
        });
    }

    pub fn discard_review(&mut self, ticket: Ticket) {
        let id = Self::placeholder_id(ticket);
        self.reviews.retain(|review| review.id != id);
    }

    pub fn placeholder_id(ticket: Ticket) -> String {
        format!("pending-{}", ticket)
    }

    pub fn is_empty(&self) -> bool {
        self.watchlist.is_empty() && self.reviews.is_empty()
    }

    pub fn clear(&mut self) {
        self.watchlist.clear();
        self.reviews.clear();
    }
}
