//! The committed state behind the store lock and its reducer steps
//!
//! Every method here runs synchronously under the lock and either applies
//! completely or leaves the state untouched.

use cinelog_api::ApiError;
use cinelog_models::{Movie, MovieId, Page, Review, ReviewId, User, WatchlistItem, WatchlistStats, WatchlistStatus};
use tracing::{debug, info, warn};
use crate::aggregate::{AggregateTracker, StatsSource, StatsUpdate};
use crate::entity_store::{Collection, EntityStore};
use crate::error::{DispatchError, SurfacedError};
use crate::mutation::{MutationKey, OptimisticOverlay, Operation, PendingSet, Ticket};
use crate::pagination::Cursors;
use crate::snapshot::{ReviewOwner, Session, SessionStatus, Snapshot};

/// Session generation; bumped whenever authenticated state is thrown away
pub type Epoch = u64;

#[derive(Debug, Default)]
pub struct CatalogState {
    entities: EntityStore,
    aggregates: AggregateTracker,
    cursors: Cursors,
    featured: Vec<Movie>,
    trending: Vec<Movie>,
    search_results: Vec<Movie>,
    current_movie: Option<Movie>,
    reviews_movie_id: Option<MovieId>,
    user_reviews: Collection<Review>,
    user_reviews_owner: Option<ReviewOwner>,
    pending: PendingSet,
    overlay: OptimisticOverlay,
    last_error: Option<SurfacedError>,
    session: Session,
    epoch: Epoch,
    version: u64,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn aggregates(&self) -> &AggregateTracker {
        &self.aggregates
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reject results that belong to an earlier session
    pub fn ensure_epoch(&self, epoch: Epoch, operation: Operation) -> Result<(), DispatchError> {
        if self.epoch == epoch {
            Ok(())
        } else {
            debug!("Discarding {} result from epoch {} (now {})", operation, epoch, self.epoch);
            Err(DispatchError::Superseded(operation))
        }
    }

    // Movies

    pub fn load_movies(&mut self, page: Page<Movie>) {
        self.entities.replace_collection(page.items);
        self.cursors.movies.apply(&page.page_info);
    }

    pub fn set_featured(&mut self, movies: Vec<Movie>) {
        self.featured = movies;
    }

    pub fn set_trending(&mut self, movies: Vec<Movie>) {
        self.trending = movies;
    }

    pub fn set_search_results(&mut self, movies: Vec<Movie>) {
        self.search_results = movies;
    }

    /// Show a movie's detail record, refreshing its row in the listing if present
    pub fn set_current_movie(&mut self, movie: Option<Movie>) {
        if let Some(movie) = &movie {
            self.entities.collection_mut::<Movie>().replace_existing(movie.clone());
        }
        self.current_movie = movie;
    }

    // Reviews

    pub fn load_movie_reviews(&mut self, movie_id: &str, page: Page<Review>) {
        self.entities.replace_collection(page.items);
        self.reviews_movie_id = Some(movie_id.to_string());
        self.cursors.movie_reviews.apply(&page.page_info);
    }

    pub fn load_user_reviews(&mut self, owner: ReviewOwner, page: Page<Review>) {
        self.user_reviews.replace_all(page.items);
        self.user_reviews_owner = Some(owner);
        self.cursors.user_reviews.apply(&page.page_info);
    }

    /// Whether a review this client just wrote belongs in `user_reviews`
    fn lists_reviews_of(&self, user_id: &str) -> bool {
        match &self.user_reviews_owner {
            Some(ReviewOwner::Me) => true,
            Some(ReviewOwner::User(owner)) => owner == user_id,
            None => false,
        }
    }

    pub fn begin_submit_review(
        &mut self,
        movie_id: &str,
        rating: u8,
        text: &str,
    ) -> Result<Ticket, DispatchError> {
        let key = MutationKey::SubmitReview(movie_id.to_string());
        let ticket = self.pending.try_begin(&key)?;
        let user_id = self.session.user_id().cloned();
        self.overlay.project_review(ticket, movie_id, user_id, rating, text);
        Ok(ticket)
    }

    pub fn commit_submit_review(&mut self, ticket: Ticket, review: Review) -> Result<(), DispatchError> {
        let key = MutationKey::SubmitReview(review.movie_id.clone());
        self.release(&key, ticket, Operation::SubmitReview)?;

        if self.reviews_movie_id.as_ref() == Some(&review.movie_id) {
            self.entities.upsert_many(vec![review.clone()]);
        }
        if self.lists_reviews_of(&review.user_id) {
            self.user_reviews.upsert_many(vec![review.clone()]);
        }
        self.settle(Operation::SubmitReview, &key);
        info!("Review {} committed for movie {}", review.id, review.movie_id);
        Ok(())
    }

    /// Claim the per-review key for an edit, delete or helpful vote
    pub fn begin_review_change(&mut self, review_id: &str) -> Result<Ticket, DispatchError> {
        self.pending.try_begin(&MutationKey::Review(review_id.to_string()))
    }

    pub fn commit_review_update(&mut self, ticket: Ticket, review: Review) -> Result<(), DispatchError> {
        let key = MutationKey::Review(review.id.clone());
        self.release(&key, ticket, Operation::UpdateReview)?;
        self.entities.collection_mut::<Review>().replace_existing(review.clone());
        self.user_reviews.replace_existing(review);
        self.settle(Operation::UpdateReview, &key);
        Ok(())
    }

    pub fn commit_review_delete(&mut self, ticket: Ticket, review_id: &ReviewId) -> Result<(), DispatchError> {
        let key = MutationKey::Review(review_id.clone());
        self.release(&key, ticket, Operation::DeleteReview)?;
        self.entities.remove::<Review>(review_id);
        self.user_reviews.remove(review_id);
        self.settle(Operation::DeleteReview, &key);
        Ok(())
    }

    pub fn commit_helpful_votes(
        &mut self,
        ticket: Ticket,
        review_id: &ReviewId,
        votes: u32,
    ) -> Result<(), DispatchError> {
        let key = MutationKey::Review(review_id.clone());
        self.release(&key, ticket, Operation::MarkHelpful)?;
        self.entities
            .collection_mut::<Review>()
            .update(review_id, |review| review.helpful_votes = votes);
        self.user_reviews.update(review_id, |review| review.helpful_votes = votes);
        self.settle(Operation::MarkHelpful, &key);
        Ok(())
    }

    // Watchlist

    pub fn load_watchlist(&mut self, page: Page<WatchlistItem>, stats: StatsUpdate) {
        self.aggregates.on_watchlist_bulk_load(&page.items, stats);
        self.entities.replace_collection(page.items);
        self.cursors.watchlist.apply(&page.page_info);
    }

    pub fn set_watchlist_stats(&mut self, stats: WatchlistStats) {
        self.aggregates.set_server_stats(stats);
    }

    pub fn stats_source(&self) -> StatsSource {
        self.aggregates.source()
    }

    /// Claim a movie's watchlist key and record what the UI should show meanwhile
    pub fn begin_watchlist_change(
        &mut self,
        movie_id: &str,
        projected: Option<WatchlistStatus>,
    ) -> Result<Ticket, DispatchError> {
        let ticket = self.pending.try_begin(&MutationKey::Watchlist(movie_id.to_string()))?;
        self.overlay.project_watchlist(movie_id, projected);
        Ok(ticket)
    }

    pub fn commit_watchlist_add(
        &mut self,
        ticket: Ticket,
        operation: Operation,
        item: WatchlistItem,
    ) -> Result<(), DispatchError> {
        let key = MutationKey::Watchlist(item.movie_id.clone());
        self.release(&key, ticket, operation)?;

        // The server may hand back a different entry id for a movie already listed
        if let Some(stale) = self.entities.watchlist_entry(&item.movie_id).map(|i| i.id.clone()) {
            if stale != item.id {
                self.entities.remove::<WatchlistItem>(&stale);
            }
        }
        self.aggregates.on_watchlist_add(&item);
        self.entities.upsert_many(vec![item]);
        self.settle(operation, &key);
        Ok(())
    }

    /// Returns whether the movie was on the loaded watchlist
    pub fn commit_watchlist_remove(
        &mut self,
        ticket: Ticket,
        operation: Operation,
        movie_id: &str,
    ) -> Result<bool, DispatchError> {
        let key = MutationKey::Watchlist(movie_id.to_string());
        self.release(&key, ticket, operation)?;

        let entry = self.entities.watchlist_entry(movie_id).map(|item| item.id.clone());
        if let Some(id) = &entry {
            self.entities.remove::<WatchlistItem>(id);
        }
        self.aggregates.on_watchlist_remove(movie_id);
        self.settle(operation, &key);
        Ok(entry.is_some())
    }

    /// Returns whether the movie was on the loaded watchlist
    pub fn commit_watchlist_status(&mut self, ticket: Ticket, item: WatchlistItem) -> Result<bool, DispatchError> {
        let key = MutationKey::Watchlist(item.movie_id.clone());
        self.release(&key, ticket, Operation::UpdateWatchlistStatus)?;

        let tracked = match self.aggregates.status_of(&item.movie_id) {
            Some(old) => {
                self.aggregates.on_watchlist_status_change(&item.movie_id, old, item.status);
                let movie_id = item.movie_id.clone();
                let status = item.status;
                let collection = self.entities.collection_mut::<WatchlistItem>();
                if !collection.replace_existing(item) {
                    // Entry id changed server side; keep the listed record, move its status
                    let listed = collection.find(|i| i.movie_id == movie_id).map(|i| i.id.clone());
                    if let Some(id) = listed {
                        collection.update(&id, |listed| listed.status = status);
                    }
                }
                true
            }
            None => false,
        };
        self.settle(Operation::UpdateWatchlistStatus, &key);
        Ok(tracked)
    }

    // Failures and session

    /// Record a failed request and return the error for the caller
    ///
    /// `Unauthorized` also invalidates the session. `Busy` and `Superseded`
    /// are returned as is, they don't replace the surfaced error.
    pub fn record_failure(
        &mut self,
        operation: Operation,
        key: Option<MutationKey>,
        error: DispatchError,
    ) -> DispatchError {
        if matches!(error, DispatchError::Busy(_) | DispatchError::Superseded(_)) {
            return error;
        }
        if matches!(error, DispatchError::Api(ApiError::NotFound)) && operation == Operation::FetchMovie {
            self.current_movie = None;
        }
        if matches!(error, DispatchError::Api(ApiError::Unauthorized)) {
            self.invalidate_session();
        }
        warn!("{} failed: {}", operation, error);
        self.last_error = Some(SurfacedError::new(operation, key, &error));
        error
    }

    /// Fail a pending mutation: drop its projection and surface the error
    pub fn fail_mutation(
        &mut self,
        operation: Operation,
        key: &MutationKey,
        ticket: Ticket,
        error: DispatchError,
    ) -> DispatchError {
        match self.release(key, ticket, operation) {
            Ok(()) => self.record_failure(operation, Some(key.clone()), error),
            Err(superseded) => superseded,
        }
    }

    /// Throw away everything that belongs to the signed-in user
    pub fn invalidate_session(&mut self) {
        self.entities.replace_collection(Vec::<WatchlistItem>::new());
        self.aggregates.clear();
        self.cursors.watchlist = Default::default();
        if self.user_reviews_owner == Some(ReviewOwner::Me) {
            self.user_reviews.clear();
            self.user_reviews_owner = None;
            self.cursors.user_reviews = Default::default();
        }
        self.overlay.clear();
        self.pending.clear();
        self.session = Session {
            status: SessionStatus::LoginRequired,
            user: None,
        };
        self.epoch += 1;
        info!("Session invalidated, authenticated views cleared (epoch {})", self.epoch);
    }

    pub fn set_session_user(&mut self, user: Option<User>) {
        self.session = match user {
            Some(user) => Session {
                status: SessionStatus::Authenticated,
                user: Some(user),
            },
            None => Session::default(),
        };
    }

    /// Back to an empty store; anything still in flight will be discarded
    pub fn reset(&mut self) {
        let mut pending = std::mem::take(&mut self.pending);
        pending.clear();
        *self = Self {
            pending,
            epoch: self.epoch + 1,
            version: self.version,
            ..Self::default()
        };
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn clear_current_movie(&mut self) {
        self.current_movie = None;
    }

    pub fn clear_search_results(&mut self) {
        self.search_results.clear();
    }

    /// Clear the surfaced error if it came from this operation
    pub fn settle_fetch(&mut self, operation: Operation) {
        if self.last_error.as_ref().is_some_and(|e| e.operation == operation && e.key.is_none()) {
            self.last_error = None;
        }
    }

    fn settle(&mut self, operation: Operation, key: &MutationKey) {
        if self
            .last_error
            .as_ref()
            .is_some_and(|e| e.operation == operation && e.key.as_ref() == Some(key))
        {
            self.last_error = None;
        }
    }

    /// End a pending mutation and drop its projection
    ///
    /// Fails with `Superseded` when the ticket no longer owns the key,
    /// which happens after the session was invalidated or the store reset.
    fn release(&mut self, key: &MutationKey, ticket: Ticket, operation: Operation) -> Result<(), DispatchError> {
        if !self.pending.finish(key, ticket) {
            debug!("Discarding stale {} result for {}", operation, key);
            return Err(DispatchError::Superseded(operation));
        }
        match key {
            MutationKey::Watchlist(movie_id) => self.overlay.discard_watchlist(movie_id),
            MutationKey::SubmitReview(_) => self.overlay.discard_review(ticket),
            MutationKey::Review(_) => {}
        }
        Ok(())
    }

    /// Checked after every reducer step in debug builds
    pub fn is_consistent(&self) -> bool {
        let items: Vec<WatchlistItem> = self.entities.list();
        self.aggregates.is_consistent_with(&items)
    }

    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            movies: self.entities.list(),
            featured_movies: self.featured.clone(),
            trending_movies: self.trending.clone(),
            search_results: self.search_results.clone(),
            current_movie: self.current_movie.clone(),
            reviews: self.entities.list(),
            reviews_movie_id: self.reviews_movie_id.clone(),
            user_reviews: self.user_reviews.to_vec(),
            user_reviews_owner: self.user_reviews_owner.clone(),
            watchlist_items: self.entities.list(),
            watchlist_status_map: self.aggregates.status_map().clone(),
            watchlist_stats: self.aggregates.stats(),
            stats_source: self.aggregates.source(),
            pagination: self.cursors,
            pending_keys: self.pending.keys(),
            optimistic: self.overlay.clone(),
            last_error: self.last_error.clone(),
            session: self.session.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{movie, review, watchlist_item};
    use cinelog_models::PageInfo;

    fn loaded_state(items: Vec<WatchlistItem>) -> CatalogState {
        let mut state = CatalogState::new();
        let info = PageInfo::new(1, 1, items.len() as u32);
        state.load_watchlist(Page::new(items, info), StatsUpdate::Recompute);
        state
    }

    #[test]
    fn test_add_commit_updates_entities_and_aggregates() {
        let mut state = CatalogState::new();
        let ticket = state.begin_watchlist_change("m1", Some(WatchlistStatus::WantToWatch)).unwrap();
        assert_eq!(state.snapshot().effective_status("m1"), Some(WatchlistStatus::WantToWatch));
        assert!(state.snapshot().watchlist_items.is_empty());

        state
            .commit_watchlist_add(ticket, Operation::AddToWatchlist, watchlist_item("w1", "m1", WatchlistStatus::WantToWatch))
            .unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.watchlist_items.len(), 1);
        assert_eq!(snapshot.watchlist_stats.want_to_watch, 1);
        assert!(snapshot.optimistic.is_empty());
        assert!(snapshot.pending_keys.is_empty());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_failed_mutation_leaves_committed_state() {
        let mut state = loaded_state(vec![watchlist_item("w1", "m1", WatchlistStatus::Watching)]);
        let before = state.snapshot();
        let key = MutationKey::Watchlist("m1".to_string());
        let ticket = state.begin_watchlist_change("m1", None).unwrap();

        let error = state.fail_mutation(
            Operation::RemoveFromWatchlist,
            &key,
            ticket,
            DispatchError::Api(ApiError::Network("connection reset".into())),
        );

        let after = state.snapshot();
        assert!(matches!(error, DispatchError::Api(ApiError::Network(_))));
        assert_eq!(after.watchlist_items, before.watchlist_items);
        assert_eq!(after.watchlist_status_map, before.watchlist_status_map);
        assert_eq!(after.watchlist_stats, before.watchlist_stats);
        assert!(after.optimistic.is_empty());
        assert_eq!(after.last_error.map(|e| e.key), Some(Some(key)));
    }

    #[test]
    fn test_invalidation_discards_in_flight_commit() {
        let mut state = loaded_state(vec![watchlist_item("w1", "m1", WatchlistStatus::Watching)]);
        let ticket = state.begin_watchlist_change("m2", Some(WatchlistStatus::Watched)).unwrap();
        state.user_reviews_owner = Some(ReviewOwner::Me);
        state.user_reviews.replace_all(vec![review("r1", "m1", "u1")]);

        state.invalidate_session();
        let result = state.commit_watchlist_add(
            ticket,
            Operation::AddToWatchlist,
            watchlist_item("w2", "m2", WatchlistStatus::Watched),
        );

        assert_eq!(result, Err(DispatchError::Superseded(Operation::AddToWatchlist)));
        let snapshot = state.snapshot();
        assert!(snapshot.watchlist_items.is_empty());
        assert!(snapshot.watchlist_status_map.is_empty());
        assert_eq!(snapshot.watchlist_stats, WatchlistStats::default());
        assert!(snapshot.user_reviews.is_empty());
        assert!(snapshot.optimistic.is_empty());
        assert_eq!(snapshot.session.status, SessionStatus::LoginRequired);
        assert!(state.ensure_epoch(0, Operation::FetchWatchlist).is_err());
    }

    #[test]
    fn test_status_commit_for_unloaded_movie() {
        let mut state = loaded_state(vec![watchlist_item("w1", "m1", WatchlistStatus::Watching)]);
        let ticket = state.begin_watchlist_change("m9", Some(WatchlistStatus::Watched)).unwrap();
        let tracked = state
            .commit_watchlist_status(ticket, watchlist_item("w9", "m9", WatchlistStatus::Watched))
            .unwrap();

        assert!(!tracked);
        assert_eq!(state.snapshot().watchlist_items.len(), 1);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_remove_commit_twice_changes_nothing_more() {
        let mut state = loaded_state(vec![
            watchlist_item("w1", "m1", WatchlistStatus::Watching),
            watchlist_item("w2", "m2", WatchlistStatus::Watched),
        ]);
        let first = state.begin_watchlist_change("m1", None).unwrap();
        assert!(state.commit_watchlist_remove(first, Operation::RemoveFromWatchlist, "m1").unwrap());
        let once = state.snapshot();

        let second = state.begin_watchlist_change("m1", None).unwrap();
        assert!(!state.commit_watchlist_remove(second, Operation::RemoveFromWatchlist, "m1").unwrap());
        let twice = state.snapshot();

        assert_eq!(once.watchlist_items, twice.watchlist_items);
        assert_eq!(once.watchlist_stats, twice.watchlist_stats);
        assert_eq!(twice.watchlist_stats.total, 1);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_set_current_movie_refreshes_listing() {
        let mut state = CatalogState::new();
        state.load_movies(Page::new(vec![movie("m1", "Heat")], PageInfo::new(1, 1, 1)));
        let mut detailed = movie("m1", "Heat");
        detailed.director = Some("Michael Mann".to_string());
        state.set_current_movie(Some(detailed));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.movies[0].director.as_deref(), Some("Michael Mann"));
        assert_eq!(snapshot.current_movie.map(|m| m.id), Some("m1".to_string()));
    }

    #[test]
    fn test_reset_keeps_version_and_advances_epoch() {
        let mut state = loaded_state(vec![watchlist_item("w1", "m1", WatchlistStatus::Watching)]);
        state.bump_version();
        state.bump_version();
        let ticket = state.begin_watchlist_change("m2", None).unwrap();
        state.reset();

        assert_eq!(state.snapshot().version, 2);
        assert_eq!(state.epoch(), 1);
        assert!(state.snapshot().watchlist_items.is_empty());
        assert!(state.commit_watchlist_remove(ticket, Operation::RemoveFromWatchlist, "m2").is_err());
    }

    #[test]
    fn test_busy_does_not_replace_last_error() {
        let mut state = CatalogState::new();
        state.record_failure(
            Operation::FetchMovies,
            None,
            DispatchError::Api(ApiError::Network("timeout".into())),
        );
        state.record_failure(
            Operation::AddToWatchlist,
            None,
            DispatchError::Busy(MutationKey::Watchlist("m1".into())),
        );

        assert_eq!(state.snapshot().last_error.map(|e| e.operation), Some(Operation::FetchMovies));
        state.settle_fetch(Operation::FetchMovies);
        assert!(state.snapshot().last_error.is_none());
    }
}
