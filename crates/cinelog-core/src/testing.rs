//! In-memory `CatalogApi` and fixtures for the core's tests

use async_trait::async_trait;
use chrono::Utc;
use cinelog_api::{ApiError, ApiResult, CatalogApi};
use cinelog_models::{
    Movie, MovieFilters, Page, PageInfo, Review, ReviewEdit, WatchlistItem, WatchlistStats, WatchlistStatus,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use crate::store::CatalogStore;

pub fn movie(id: &str, title: &str) -> Movie {
    Movie::new(id, title)
}

pub fn review(id: &str, movie_id: &str, user_id: &str) -> Review {
    Review {
        id: id.to_string(),
        movie_id: movie_id.to_string(),
        user_id: user_id.to_string(),
        username: None,
        rating: 4,
        review_text: "Worth a rewatch".to_string(),
        created_at: Utc::now(),
        helpful_votes: 0,
        pending: false,
    }
}

pub fn watchlist_item(id: &str, movie_id: &str, status: WatchlistStatus) -> WatchlistItem {
    WatchlistItem {
        id: id.to_string(),
        movie_id: movie_id.to_string(),
        movie: None,
        status,
        created_at: Utc::now(),
    }
}

/// Yield until `done` holds for the current snapshot
pub async fn wait_until<A, F>(store: &CatalogStore<A>, done: F)
where
    A: CatalogApi,
    F: Fn(&crate::Snapshot) -> bool,
{
    for _ in 0..1000 {
        if done(&store.get_snapshot()) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("store never reached the expected state");
}

#[derive(Default)]
struct Server {
    movies: Vec<Movie>,
    reviews: Vec<Review>,
    watchlist: Vec<WatchlistItem>,
    failures: HashMap<&'static str, ApiError>,
    calls: Vec<&'static str>,
    next_id: u64,
}

/// Backend double holding its own copy of the data
///
/// Failures can be injected per method name and calls can be held at a
/// gate until the test releases them.
pub struct FakeCatalogApi {
    server: Mutex<Server>,
    gates: Mutex<HashMap<&'static str, Arc<Semaphore>>>,
    page_size: usize,
    user_id: String,
}

impl Default for FakeCatalogApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCatalogApi {
    pub fn new() -> Self {
        Self {
            server: Mutex::new(Server::default()),
            gates: Mutex::new(HashMap::new()),
            page_size: 10,
            user_id: "u1".to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_movies(self, movies: Vec<Movie>) -> Self {
        self.server.lock().unwrap().movies = movies;
        self
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        self.server.lock().unwrap().reviews = reviews;
        self
    }

    pub fn with_watchlist(self, items: Vec<WatchlistItem>) -> Self {
        self.server.lock().unwrap().watchlist = items;
        self
    }

    /// Make every call to `method` fail with `error` until cleared
    pub fn fail(&self, method: &'static str, error: ApiError) {
        self.server.lock().unwrap().failures.insert(method, error);
    }

    pub fn clear_failures(&self) {
        self.server.lock().unwrap().failures.clear();
    }

    /// Park calls to `method` until [`FakeCatalogApi::release`]
    pub fn hold(&self, method: &'static str) {
        self.gates.lock().unwrap().insert(method, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, method: &'static str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(method) {
            gate.close();
        }
    }

    pub fn calls(&self, method: &str) -> usize {
        self.server.lock().unwrap().calls.iter().filter(|c| **c == method).count()
    }

    pub fn server_watchlist(&self) -> Vec<WatchlistItem> {
        self.server.lock().unwrap().watchlist.clone()
    }

    async fn enter(&self, method: &'static str) -> ApiResult<()> {
        let gate = self.gates.lock().unwrap().get(method).cloned();
        if let Some(gate) = gate {
            // Closed on release, which wakes every waiter
            let _ = gate.acquire().await;
        }
        let mut server = self.server.lock().unwrap();
        server.calls.push(method);
        match server.failures.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn paginate<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let total = items.len();
        let total_pages = total.div_ceil(self.page_size).max(1) as u32;
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let slice = items.iter().skip(start).take(self.page_size).cloned().collect();
        Page::new(slice, PageInfo::new(page, total_pages, total as u32))
    }
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
    async fn fetch_movies(&self, filters: &MovieFilters, page: u32) -> ApiResult<Page<Movie>> {
        self.enter("fetch_movies").await?;
        let server = self.server.lock().unwrap();
        let matching: Vec<Movie> = server
            .movies
            .iter()
            .filter(|m| match &filters.search {
                Some(query) => m.title.to_lowercase().contains(&query.to_lowercase()),
                None => true,
            })
            .filter(|m| filters.genre.as_ref().map_or(true, |g| m.genre.contains(g)))
            .cloned()
            .collect();
        Ok(self.paginate(&matching, page))
    }

    async fn fetch_movie_by_id(&self, id: &str) -> ApiResult<Movie> {
        self.enter("fetch_movie_by_id").await?;
        let server = self.server.lock().unwrap();
        server.movies.iter().find(|m| m.id == id).cloned().ok_or(ApiError::NotFound)
    }

    async fn fetch_featured_movies(&self) -> ApiResult<Vec<Movie>> {
        self.enter("fetch_featured_movies").await?;
        Ok(self.server.lock().unwrap().movies.iter().take(3).cloned().collect())
    }

    async fn fetch_trending_movies(&self) -> ApiResult<Vec<Movie>> {
        self.enter("fetch_trending_movies").await?;
        Ok(self.server.lock().unwrap().movies.iter().rev().take(3).cloned().collect())
    }

    async fn fetch_reviews(&self, movie_id: &str, page: u32) -> ApiResult<Page<Review>> {
        self.enter("fetch_reviews").await?;
        let server = self.server.lock().unwrap();
        let reviews: Vec<Review> = server.reviews.iter().filter(|r| r.movie_id == movie_id).cloned().collect();
        Ok(self.paginate(&reviews, page))
    }

    async fn fetch_user_reviews(&self, user_id: &str, page: u32) -> ApiResult<Page<Review>> {
        self.enter("fetch_user_reviews").await?;
        let server = self.server.lock().unwrap();
        let reviews: Vec<Review> = server.reviews.iter().filter(|r| r.user_id == user_id).cloned().collect();
        Ok(self.paginate(&reviews, page))
    }

    async fn fetch_my_reviews(&self, page: u32) -> ApiResult<Page<Review>> {
        self.enter("fetch_my_reviews").await?;
        let server = self.server.lock().unwrap();
        let reviews: Vec<Review> = server.reviews.iter().filter(|r| r.user_id == self.user_id).cloned().collect();
        Ok(self.paginate(&reviews, page))
    }

    async fn submit_review(&self, movie_id: &str, rating: u8, text: &str) -> ApiResult<Review> {
        self.enter("submit_review").await?;
        let mut server = self.server.lock().unwrap();
        if server.reviews.iter().any(|r| r.movie_id == movie_id && r.user_id == self.user_id) {
            return Err(ApiError::Validation("You have already reviewed this movie".to_string()));
        }
        server.next_id += 1;
        let mut created = review(&format!("r{}", server.next_id), movie_id, &self.user_id);
        created.rating = rating;
        created.review_text = text.to_string();
        server.reviews.insert(0, created.clone());
        Ok(created)
    }

    async fn update_review(&self, review_id: &str, edit: &ReviewEdit) -> ApiResult<Review> {
        self.enter("update_review").await?;
        let mut server = self.server.lock().unwrap();
        let review = server.reviews.iter_mut().find(|r| r.id == review_id).ok_or(ApiError::NotFound)?;
        if let Some(rating) = edit.rating {
            review.rating = rating;
        }
        if let Some(text) = &edit.review_text {
            review.review_text = text.clone();
        }
        Ok(review.clone())
    }

    async fn delete_review(&self, review_id: &str) -> ApiResult<()> {
        self.enter("delete_review").await?;
        let mut server = self.server.lock().unwrap();
        let before = server.reviews.len();
        server.reviews.retain(|r| r.id != review_id);
        if server.reviews.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn mark_review_helpful(&self, review_id: &str) -> ApiResult<u32> {
        self.enter("mark_review_helpful").await?;
        let mut server = self.server.lock().unwrap();
        let review = server.reviews.iter_mut().find(|r| r.id == review_id).ok_or(ApiError::NotFound)?;
        review.helpful_votes += 1;
        Ok(review.helpful_votes)
    }

    async fn fetch_watchlist(
        &self,
        page: u32,
        status: Option<WatchlistStatus>,
    ) -> ApiResult<Page<WatchlistItem>> {
        self.enter("fetch_watchlist").await?;
        let server = self.server.lock().unwrap();
        let items: Vec<WatchlistItem> = server
            .watchlist
            .iter()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        Ok(self.paginate(&items, page))
    }

    async fn add_watchlist_item(&self, movie_id: &str, status: WatchlistStatus) -> ApiResult<WatchlistItem> {
        self.enter("add_watchlist_item").await?;
        let mut server = self.server.lock().unwrap();
        if server.watchlist.iter().any(|i| i.movie_id == movie_id) {
            return Err(ApiError::Validation("Movie already in watchlist".to_string()));
        }
        server.next_id += 1;
        let item = watchlist_item(&format!("w{}", server.next_id), movie_id, status);
        server.watchlist.insert(0, item.clone());
        Ok(item)
    }

    async fn remove_watchlist_item(&self, movie_id: &str) -> ApiResult<()> {
        self.enter("remove_watchlist_item").await?;
        let mut server = self.server.lock().unwrap();
        let before = server.watchlist.len();
        server.watchlist.retain(|i| i.movie_id != movie_id);
        if server.watchlist.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    async fn update_watchlist_status(&self, movie_id: &str, status: WatchlistStatus) -> ApiResult<WatchlistItem> {
        self.enter("update_watchlist_status").await?;
        let mut server = self.server.lock().unwrap();
        let item = server.watchlist.iter_mut().find(|i| i.movie_id == movie_id).ok_or(ApiError::NotFound)?;
        item.status = status;
        Ok(item.clone())
    }

    async fn fetch_watchlist_stats(&self) -> ApiResult<WatchlistStats> {
        self.enter("fetch_watchlist_stats").await?;
        Ok(WatchlistStats::from_items(&self.server.lock().unwrap().watchlist))
    }
}
