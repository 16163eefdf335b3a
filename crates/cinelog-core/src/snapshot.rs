use cinelog_models::{Movie, MovieId, Review, User, UserId, WatchlistItem, WatchlistStats, WatchlistStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use crate::aggregate::StatsSource;
use crate::error::SurfacedError;
use crate::mutation::{MutationKey, OptimisticOverlay};
use crate::pagination::Cursors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticated,
    /// The server rejected the session; authenticated views were cleared
    LoginRequired,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }
}

/// Whose reviews `user_reviews` holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReviewOwner {
    User(UserId),
    /// The signed-in user
    Me,
}

/// Immutable view of the store after a reducer step
///
/// Everything except `optimistic` is committed server state. Pending
/// projections are only visible through `optimistic` and the helpers
/// that merge it in.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    pub movies: Vec<Movie>,
    pub featured_movies: Vec<Movie>,
    pub trending_movies: Vec<Movie>,
    pub search_results: Vec<Movie>,
    pub current_movie: Option<Movie>,
    /// Reviews of `reviews_movie_id`
    pub reviews: Vec<Review>,
    pub reviews_movie_id: Option<MovieId>,
    pub user_reviews: Vec<Review>,
    pub user_reviews_owner: Option<ReviewOwner>,
    pub watchlist_items: Vec<WatchlistItem>,
    pub watchlist_status_map: BTreeMap<MovieId, WatchlistStatus>,
    pub watchlist_stats: WatchlistStats,
    pub stats_source: StatsSource,
    pub pagination: Cursors,
    pub pending_keys: BTreeSet<MutationKey>,
    pub optimistic: OptimisticOverlay,
    pub last_error: Option<SurfacedError>,
    pub session: Session,
}

impl Snapshot {
    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.pending_keys.contains(key)
    }

    /// Watchlist status with pending projections applied
    pub fn effective_status(&self, movie_id: &str) -> Option<WatchlistStatus> {
        match self.optimistic.watchlist.get(movie_id) {
            Some(projected) => *projected,
            None => self.watchlist_status_map.get(movie_id).copied(),
        }
    }

    /// Counters with pending projections applied on top of the committed ones
    pub fn effective_stats(&self) -> WatchlistStats {
        let mut stats = self.watchlist_stats;
        for (movie_id, projected) in &self.optimistic.watchlist {
            match (self.watchlist_status_map.get(movie_id).copied(), *projected) {
                (None, Some(new)) => stats.increment(new),
                (Some(old), None) => stats.decrement(old),
                (Some(old), Some(new)) => stats.move_between(old, new),
                (None, None) => {}
            }
        }
        stats
    }

    /// Movie reviews with pending submissions for the same movie listed first
    pub fn reviews_with_pending(&self) -> Vec<Review> {
        let pending = self
            .optimistic
            .reviews
            .iter()
            .filter(|review| Some(&review.movie_id) == self.reviews_movie_id.as_ref())
            .rev();
        pending.chain(self.reviews.iter()).cloned().collect()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.status == SessionStatus::Authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_map(entries: &[(&str, WatchlistStatus)]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (movie_id, status) in entries {
            snapshot.watchlist_status_map.insert(movie_id.to_string(), *status);
            snapshot.watchlist_stats.increment(*status);
        }
        snapshot
    }

    #[test]
    fn test_effective_status_prefers_projection() {
        let mut snapshot = snapshot_with_map(&[("m1", WatchlistStatus::Watching)]);
        snapshot.optimistic.project_watchlist("m1", None);
        snapshot.optimistic.project_watchlist("m2", Some(WatchlistStatus::Watched));

        assert_eq!(snapshot.effective_status("m1"), None);
        assert_eq!(snapshot.effective_status("m2"), Some(WatchlistStatus::Watched));
        assert_eq!(snapshot.watchlist_status_map.get("m1"), Some(&WatchlistStatus::Watching));
    }

    #[test]
    fn test_effective_stats() {
        let mut snapshot = snapshot_with_map(&[
            ("m1", WatchlistStatus::Watching),
            ("m2", WatchlistStatus::WantToWatch),
        ]);
        snapshot.optimistic.project_watchlist("m1", None);
        snapshot.optimistic.project_watchlist("m2", Some(WatchlistStatus::Watched));
        snapshot.optimistic.project_watchlist("m3", Some(WatchlistStatus::WantToWatch));

        let stats = snapshot.effective_stats();
        assert_eq!((stats.want_to_watch, stats.watching, stats.watched, stats.total), (1, 0, 1, 2));
        assert_eq!(snapshot.watchlist_stats.total, 2);
    }

    #[test]
    fn test_reviews_with_pending_only_for_shown_movie() {
        let mut snapshot = Snapshot {
            reviews_movie_id: Some("m1".to_string()),
            ..Snapshot::default()
        };
        snapshot.optimistic.project_review(1, "m1", None, 5, "Loved it");
        snapshot.optimistic.project_review(2, "m2", None, 2, "Meh");

        let reviews = snapshot.reviews_with_pending();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review_text, "Loved it");
        assert!(reviews[0].pending);
    }
}
