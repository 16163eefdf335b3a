use async_trait::async_trait;
use cinelog_models::{
    Movie, MovieFilters, Page, Review, ReviewEdit, WatchlistItem, WatchlistStats, WatchlistStatus,
};
use crate::error::ApiResult;

/// Remote catalog collaborator consumed by the state core
///
/// Every call may suspend; none of them touch local state. The HTTP
/// implementation lives in [`crate::http`], tests use in-memory fakes.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    // Movies
    async fn fetch_movies(&self, filters: &MovieFilters, page: u32) -> ApiResult<Page<Movie>>;
    async fn fetch_movie_by_id(&self, id: &str) -> ApiResult<Movie>;
    async fn fetch_featured_movies(&self) -> ApiResult<Vec<Movie>>;
    async fn fetch_trending_movies(&self) -> ApiResult<Vec<Movie>>;

    /// Free-text search over the same endpoint as `fetch_movies`
    async fn search_movies(&self, query: &str) -> ApiResult<Page<Movie>> {
        self.fetch_movies(&MovieFilters::search(query), 1).await
    }

    // Reviews
    async fn fetch_reviews(&self, movie_id: &str, page: u32) -> ApiResult<Page<Review>>;
    async fn fetch_user_reviews(&self, user_id: &str, page: u32) -> ApiResult<Page<Review>>;
    async fn fetch_my_reviews(&self, page: u32) -> ApiResult<Page<Review>>;
    async fn submit_review(&self, movie_id: &str, rating: u8, text: &str) -> ApiResult<Review>;
    async fn update_review(&self, review_id: &str, edit: &ReviewEdit) -> ApiResult<Review>;
    async fn delete_review(&self, review_id: &str) -> ApiResult<()>;
    /// Returns the review's new helpful vote count
    async fn mark_review_helpful(&self, review_id: &str) -> ApiResult<u32>;

    // Watchlist
    async fn fetch_watchlist(
        &self,
        page: u32,
        status: Option<WatchlistStatus>,
    ) -> ApiResult<Page<WatchlistItem>>;
    async fn add_watchlist_item(
        &self,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> ApiResult<WatchlistItem>;
    async fn remove_watchlist_item(&self, movie_id: &str) -> ApiResult<()>;
    async fn update_watchlist_status(
        &self,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> ApiResult<WatchlistItem>;
    async fn fetch_watchlist_stats(&self) -> ApiResult<WatchlistStats>;
}
