//! Dispatch methods: one per intent
//!
//! Fetches call the API, then apply the result in a single reducer step.
//! Mutations first claim their key and record an optimistic projection,
//! then resolve on a spawned task so the outcome reaches the store even if
//! the dispatching caller is dropped.

use cinelog_api::{ApiError, CatalogApi};
use cinelog_models::{
    Movie, MovieFilters, Review, ReviewEdit, WatchlistItem, WatchlistStats, WatchlistStatus, MAX_RATING,
    MIN_RATING,
};
use std::future::Future;
use tracing::{debug, info, warn};
use crate::aggregate::{StatsSource, StatsUpdate};
use crate::error::DispatchError;
use crate::mutation::{MutationKey, Operation, Ticket};
use crate::snapshot::ReviewOwner;
use crate::state::{CatalogState, Epoch};
use crate::store::CatalogStore;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// What a watchlist toggle ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Added(WatchlistItem),
    Removed,
}

impl<A: CatalogApi + 'static> CatalogStore<A> {
    // Movies

    pub async fn fetch_movies(&self, filters: &MovieFilters, page: u32) -> DispatchResult<()> {
        let epoch = self.epoch();
        debug!("Fetching movies page {} with {:?}", page, filters);
        let result = self.api().fetch_movies(filters, page).await;
        self.apply_fetch(Operation::FetchMovies, epoch, result, |state, page| state.load_movies(page))
    }

    pub async fn fetch_movie(&self, id: &str) -> DispatchResult<Movie> {
        let epoch = self.epoch();
        let result = self.api().fetch_movie_by_id(id).await;
        self.apply_fetch(Operation::FetchMovie, epoch, result, |state, movie: Movie| {
            state.set_current_movie(Some(movie.clone()));
            movie
        })
    }

    pub async fn fetch_featured(&self) -> DispatchResult<()> {
        let epoch = self.epoch();
        let result = self.api().fetch_featured_movies().await;
        self.apply_fetch(Operation::FetchFeatured, epoch, result, |state, movies| state.set_featured(movies))
    }

    pub async fn fetch_trending(&self) -> DispatchResult<()> {
        let epoch = self.epoch();
        let result = self.api().fetch_trending_movies().await;
        self.apply_fetch(Operation::FetchTrending, epoch, result, |state, movies| state.set_trending(movies))
    }

    /// Search by title; a blank query just clears the results
    pub async fn search_movies(&self, query: &str) -> DispatchResult<()> {
        let query = query.trim();
        if query.is_empty() {
            self.clear_search_results();
            return Ok(());
        }
        let epoch = self.epoch();
        let result = self.api().search_movies(query).await;
        self.apply_fetch(Operation::SearchMovies, epoch, result, |state, page| {
            state.set_search_results(page.items)
        })
    }

    // Reviews

    pub async fn fetch_reviews(&self, movie_id: &str, page: u32) -> DispatchResult<()> {
        let epoch = self.epoch();
        let result = self.api().fetch_reviews(movie_id, page).await;
        self.apply_fetch(Operation::FetchReviews, epoch, result, |state, page| {
            state.load_movie_reviews(movie_id, page)
        })
    }

    pub async fn fetch_user_reviews(&self, user_id: &str, page: u32) -> DispatchResult<()> {
        let epoch = self.epoch();
        let result = self.api().fetch_user_reviews(user_id, page).await;
        self.apply_fetch(Operation::FetchUserReviews, epoch, result, |state, page| {
            state.load_user_reviews(ReviewOwner::User(user_id.to_string()), page)
        })
    }

    pub async fn fetch_my_reviews(&self, page: u32) -> DispatchResult<()> {
        let epoch = self.epoch();
        let result = self.api().fetch_my_reviews(page).await;
        self.apply_fetch(Operation::FetchMyReviews, epoch, result, |state, page| {
            state.load_user_reviews(ReviewOwner::Me, page)
        })
    }

    pub async fn submit_review(&self, movie_id: &str, rating: u8, text: &str) -> DispatchResult<Review> {
        let operation = Operation::SubmitReview;
        let key = MutationKey::SubmitReview(movie_id.to_string());
        if let Err(error) = validate_review(Some(rating), Some(text)) {
            return Err(self.update(|state| state.record_failure(operation, Some(key), error)));
        }
        let text = text.trim().to_string();
        let ticket = self.update(|state| state.begin_submit_review(movie_id, rating, &text))?;
        info!("Submitting {}-star review for movie {}", rating, movie_id);

        let store = self.clone();
        let movie_id = movie_id.to_string();
        detached(operation, async move {
            let result = store.api().submit_review(&movie_id, rating, &text).await;
            store.update(|state| match result {
                Ok(review) => state.commit_submit_review(ticket, review.clone()).map(|_| review),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })
        })
        .await
    }

    pub async fn update_review(&self, review_id: &str, edit: ReviewEdit) -> DispatchResult<Review> {
        let operation = Operation::UpdateReview;
        let key = MutationKey::Review(review_id.to_string());
        let checked = if edit.is_empty() {
            Err(DispatchError::Invalid("Nothing to update".to_string()))
        } else {
            validate_review(edit.rating, edit.review_text.as_deref())
        };
        if let Err(error) = checked {
            return Err(self.update(|state| state.record_failure(operation, Some(key), error)));
        }
        let ticket = self.update(|state| state.begin_review_change(review_id))?;

        let store = self.clone();
        let review_id = review_id.to_string();
        detached(operation, async move {
            let result = store.api().update_review(&review_id, &edit).await;
            store.update(|state| match result {
                Ok(review) => state.commit_review_update(ticket, review.clone()).map(|_| review),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })
        })
        .await
    }

    pub async fn delete_review(&self, review_id: &str) -> DispatchResult<()> {
        let operation = Operation::DeleteReview;
        let key = MutationKey::Review(review_id.to_string());
        let ticket = self.update(|state| state.begin_review_change(review_id))?;

        let store = self.clone();
        let review_id = review_id.to_string();
        detached(operation, async move {
            let result = store.api().delete_review(&review_id).await;
            store.update(|state| match result {
                Ok(()) => state.commit_review_delete(ticket, &review_id),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })
        })
        .await
    }

    /// Returns the review's helpful vote count as reported by the server
    pub async fn mark_review_helpful(&self, review_id: &str) -> DispatchResult<u32> {
        let operation = Operation::MarkHelpful;
        let key = MutationKey::Review(review_id.to_string());
        let ticket = self.update(|state| state.begin_review_change(review_id))?;

        let store = self.clone();
        let review_id = review_id.to_string();
        detached(operation, async move {
            let result = store.api().mark_review_helpful(&review_id).await;
            store.update(|state| match result {
                Ok(votes) => state.commit_helpful_votes(ticket, &review_id, votes).map(|_| votes),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })
        })
        .await
    }

    // Watchlist

    /// Load a watchlist page, optionally filtered by status
    ///
    /// An unfiltered single page is the whole watchlist, so its items are
    /// counted directly. Anything else takes the server's totals.
    pub async fn fetch_watchlist(&self, page: u32, status: Option<WatchlistStatus>) -> DispatchResult<()> {
        let operation = Operation::FetchWatchlist;
        let epoch = self.epoch();
        let refresh_stats = self.options().refresh_stats_on_partial_page;
        let api = self.api();

        let known_partial = status.is_some() || page > 1;
        let fetched = if known_partial && refresh_stats {
            futures::try_join!(api.fetch_watchlist(page, status), api.fetch_watchlist_stats())
                .map(|(items, stats)| (items, Some(stats)))
        } else {
            api.fetch_watchlist(page, status).await.map(|items| (items, None))
        };
        let (items, stats) = match fetched {
            Ok(fetched) => fetched,
            Err(error) => return Err(self.fail_fetch(operation, epoch, error)),
        };

        let complete = status.is_none() && items.page_info.is_complete();
        let update = match stats {
            Some(stats) => StatsUpdate::Server(stats),
            None if complete => StatsUpdate::Recompute,
            None if refresh_stats => match api.fetch_watchlist_stats().await {
                Ok(stats) => StatsUpdate::Server(stats),
                Err(error) => return Err(self.fail_fetch(operation, epoch, error)),
            },
            None => StatsUpdate::Keep,
        };
        debug!(
            "Watchlist page {}/{} with {} items, counters {:?}",
            items.page_info.current_page,
            items.page_info.total_pages,
            items.items.len(),
            update
        );
        self.apply_fetch(operation, epoch, Ok(items), |state, items| state.load_watchlist(items, update))
    }

    /// Page through the unfiltered watchlist until `movie_id` is loaded
    ///
    /// Stops at the first page listing the movie, or after the last page.
    /// Returns the movie's committed status, if any.
    pub async fn seek_watchlist_entry(&self, movie_id: &str) -> DispatchResult<Option<WatchlistStatus>> {
        let mut page = 1;
        loop {
            self.fetch_watchlist(page, None).await?;
            let snapshot = self.get_snapshot();
            if let Some(status) = snapshot.watchlist_status_map.get(movie_id) {
                return Ok(Some(*status));
            }
            let cursor = snapshot.pagination.watchlist;
            // A server that doesn't advance the page would loop forever
            if !cursor.has_next() || cursor.current_page() < page {
                debug!("Movie {} not found after {} watchlist pages", movie_id, page);
                return Ok(None);
            }
            page = cursor.current_page() + 1;
        }
    }

    pub async fn fetch_watchlist_stats(&self) -> DispatchResult<WatchlistStats> {
        let epoch = self.epoch();
        let result = self.api().fetch_watchlist_stats().await;
        self.apply_fetch(Operation::FetchWatchlistStats, epoch, result, |state, stats| {
            state.set_watchlist_stats(stats);
            stats
        })
    }

    pub async fn add_to_watchlist(&self, movie_id: &str, status: WatchlistStatus) -> DispatchResult<WatchlistItem> {
        let ticket = self.update(|state| state.begin_watchlist_change(movie_id, Some(status)))?;
        self.resolve_add(Operation::AddToWatchlist, ticket, movie_id, status).await
    }

    pub async fn remove_from_watchlist(&self, movie_id: &str) -> DispatchResult<()> {
        let ticket = self.update(|state| state.begin_watchlist_change(movie_id, None))?;
        self.resolve_remove(Operation::RemoveFromWatchlist, ticket, movie_id).await
    }

    pub async fn update_watchlist_status(
        &self,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> DispatchResult<WatchlistItem> {
        let operation = Operation::UpdateWatchlistStatus;
        let key = MutationKey::Watchlist(movie_id.to_string());
        let ticket = self.update(|state| state.begin_watchlist_change(movie_id, Some(status)))?;
        let epoch = self.epoch();

        let store = self.clone();
        let movie_id = movie_id.to_string();
        detached(operation, async move {
            let result = store.api().update_watchlist_status(&movie_id, status).await;
            let (item, tracked) = store.update(|state| match result {
                Ok(item) => state.commit_watchlist_status(ticket, item.clone()).map(|tracked| (item, tracked)),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })?;
            if !tracked {
                store.refresh_server_stats(epoch).await;
            }
            Ok(item)
        })
        .await
    }

    /// Remove the movie if it is on the watchlist, otherwise add it
    ///
    /// Membership is read from the committed status map in the same step
    /// that claims the key, so two toggles can't both decide to add.
    pub async fn toggle_watchlist(&self, movie_id: &str) -> DispatchResult<ToggleOutcome> {
        let operation = Operation::ToggleWatchlist;
        let default_status = self.options().default_watchlist_status;
        let (ticket, listed) = self.update(|state| {
            let listed = state.aggregates().status_of(movie_id).is_some();
            let projected = if listed { None } else { Some(default_status) };
            state.begin_watchlist_change(movie_id, projected).map(|ticket| (ticket, listed))
        })?;

        if listed {
            self.resolve_remove(operation, ticket, movie_id).await?;
            Ok(ToggleOutcome::Removed)
        } else {
            let item = self.resolve_add(operation, ticket, movie_id, default_status).await?;
            Ok(ToggleOutcome::Added(item))
        }
    }

    async fn resolve_add(
        &self,
        operation: Operation,
        ticket: Ticket,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> DispatchResult<WatchlistItem> {
        info!("Adding movie {} to watchlist as {}", movie_id, status);
        let key = MutationKey::Watchlist(movie_id.to_string());
        let store = self.clone();
        let movie_id = movie_id.to_string();
        detached(operation, async move {
            let result = store.api().add_watchlist_item(&movie_id, status).await;
            store.update(|state| match result {
                Ok(item) => state.commit_watchlist_add(ticket, operation, item.clone()).map(|_| item),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })
        })
        .await
    }

    async fn resolve_remove(&self, operation: Operation, ticket: Ticket, movie_id: &str) -> DispatchResult<()> {
        info!("Removing movie {} from watchlist", movie_id);
        let key = MutationKey::Watchlist(movie_id.to_string());
        let epoch = self.epoch();
        let store = self.clone();
        let movie_id = movie_id.to_string();
        detached(operation, async move {
            let result = store.api().remove_watchlist_item(&movie_id).await;
            let tracked = store.update(|state| match result {
                Ok(()) => state.commit_watchlist_remove(ticket, operation, &movie_id),
                Err(error) => Err(state.fail_mutation(operation, &key, ticket, error.into())),
            })?;
            if !tracked {
                store.refresh_server_stats(epoch).await;
            }
            Ok(())
        })
        .await
    }

    /// Re-read server totals after a change to an item that isn't loaded
    ///
    /// Only needed while the counters are server sourced. Failures are
    /// logged and otherwise ignored: the mutation itself already committed.
    async fn refresh_server_stats(&self, epoch: Epoch) {
        if self.read(|state| state.stats_source()) != StatsSource::Server {
            return;
        }
        match self.api().fetch_watchlist_stats().await {
            Ok(stats) => {
                let _ = self.update(|state| {
                    state
                        .ensure_epoch(epoch, Operation::FetchWatchlistStats)
                        .map(|_| state.set_watchlist_stats(stats))
                });
            }
            Err(ApiError::Unauthorized) => {
                let _ = self.fail_fetch(Operation::FetchWatchlistStats, epoch, ApiError::Unauthorized);
            }
            Err(error) => warn!("Could not refresh watchlist stats: {}", error),
        }
    }

    /// Apply a fetch result in one step, unless the session moved on meanwhile
    fn apply_fetch<T, R>(
        &self,
        operation: Operation,
        epoch: Epoch,
        result: Result<T, ApiError>,
        apply: impl FnOnce(&mut CatalogState, T) -> R,
    ) -> DispatchResult<R> {
        self.update(|state| {
            state.ensure_epoch(epoch, operation)?;
            match result {
                Ok(value) => {
                    state.settle_fetch(operation);
                    Ok(apply(state, value))
                }
                Err(error) => Err(state.record_failure(operation, None, error.into())),
            }
        })
    }

    fn fail_fetch(&self, operation: Operation, epoch: Epoch, error: ApiError) -> DispatchError {
        self.update(|state| match state.ensure_epoch(epoch, operation) {
            Ok(()) => state.record_failure(operation, None, error.into()),
            Err(superseded) => superseded,
        })
    }

}

/// Run a mutation's resolution on its own task
async fn detached<T, F>(operation: Operation, resolution: F) -> DispatchResult<T>
where
    T: Send + 'static,
    F: Future<Output = DispatchResult<T>> + Send + 'static,
{
    match tokio::spawn(resolution).await {
        Ok(result) => result,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(_) => Err(DispatchError::Superseded(operation)),
    }
}

fn validate_review(rating: Option<u8>, text: Option<&str>) -> Result<(), DispatchError> {
    if let Some(rating) = rating {
        if !Review::is_valid_rating(rating) {
            return Err(DispatchError::Invalid(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
    }
    if let Some(text) = text {
        if text.trim().is_empty() {
            return Err(DispatchError::Invalid("Review text cannot be empty".to_string()));
        }
    }
    Ok(())
}
