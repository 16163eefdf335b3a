use crate::error::{ApiError, ApiResult};
use crate::http::api::{
    self, HelpfulEnvelope, MovieEnvelope, MoviesEnvelope, NewReviewBody, ReviewEnvelope,
    ReviewsEnvelope, StatsEnvelope, WatchlistBody, WatchlistEnvelope, WatchlistItemEnvelope,
};
use crate::traits::CatalogApi;
use async_trait::async_trait;
use cinelog_config::ApiConfig;
use cinelog_models::{
    Movie, MovieFilters, Page, Review, ReviewEdit, WatchlistItem, WatchlistStats, WatchlistStatus,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// `CatalogApi` over the REST backend
#[derive(Clone)]
pub struct HttpCatalogApi {
    client: Arc<Client>,
    base_url: String,
    token: Option<String>,
}

pub(crate) fn create_client(config: &ApiConfig) -> Client {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl HttpCatalogApi {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Arc::new(create_client(config)),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Send a request and decode the JSON body, mapping HTTP failures to `ApiError`
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.checked(request).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("Failed to decode catalog response: {}", e);
            ApiError::from(e)
        })
    }

    /// Send a request whose response body is irrelevant
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> ApiResult<()> {
        self.checked(request).await.map(|_| ())
    }

    async fn checked(&self, request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_status(status.as_u16(), api::error_message(&body));
        debug!("Catalog request failed: {}", error);
        Err(error)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    async fn with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn review_page(&self, path: &str, page: u32) -> ApiResult<Page<Review>> {
        let envelope: ReviewsEnvelope = self.get(path, &[("page", page.to_string())]).await?;
        Ok(Page::new(
            envelope.reviews.into_iter().map(Review::from).collect(),
            envelope.pagination,
        ))
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn fetch_movies(&self, filters: &MovieFilters, page: u32) -> ApiResult<Page<Movie>> {
        let mut query = filters.to_query();
        query.push(("page", page.to_string()));
        let envelope: MoviesEnvelope = self.get("movies", &query).await?;
        Ok(Page::new(envelope.movies, envelope.pagination))
    }

    async fn fetch_movie_by_id(&self, id: &str) -> ApiResult<Movie> {
        let envelope: MovieEnvelope = self.get(&format!("movies/{}", segment(id)), &[]).await?;
        Ok(envelope.movie)
    }

    async fn fetch_featured_movies(&self) -> ApiResult<Vec<Movie>> {
        let envelope: MoviesEnvelope = self.get("movies/featured", &[]).await?;
        Ok(envelope.movies)
    }

    async fn fetch_trending_movies(&self) -> ApiResult<Vec<Movie>> {
        let envelope: MoviesEnvelope = self.get("movies/trending", &[]).await?;
        Ok(envelope.movies)
    }

    async fn fetch_reviews(&self, movie_id: &str, page: u32) -> ApiResult<Page<Review>> {
        self.review_page(&format!("reviews/movie/{}", segment(movie_id)), page).await
    }

    async fn fetch_user_reviews(&self, user_id: &str, page: u32) -> ApiResult<Page<Review>> {
        self.review_page(&format!("reviews/user/{}", segment(user_id)), page).await
    }

    async fn fetch_my_reviews(&self, page: u32) -> ApiResult<Page<Review>> {
        self.review_page("reviews/me", page).await
    }

    async fn submit_review(&self, movie_id: &str, rating: u8, text: &str) -> ApiResult<Review> {
        let body = NewReviewBody { movie_id, rating, review_text: text };
        let envelope: ReviewEnvelope = self.with_body(Method::POST, "reviews", &body).await?;
        Ok(envelope.review.into())
    }

    async fn update_review(&self, review_id: &str, edit: &ReviewEdit) -> ApiResult<Review> {
        let path = format!("reviews/{}", segment(review_id));
        let envelope: ReviewEnvelope = self.with_body(Method::PUT, &path, edit).await?;
        Ok(envelope.review.into())
    }

    async fn delete_review(&self, review_id: &str) -> ApiResult<()> {
        let path = format!("reviews/{}", segment(review_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn mark_review_helpful(&self, review_id: &str) -> ApiResult<u32> {
        let path = format!("reviews/{}/helpful", segment(review_id));
        let envelope: HelpfulEnvelope = self
            .with_body(Method::POST, &path, &serde_json::json!({}))
            .await?;
        Ok(envelope.helpful_votes)
    }

    async fn fetch_watchlist(
        &self,
        page: u32,
        status: Option<WatchlistStatus>,
    ) -> ApiResult<Page<WatchlistItem>> {
        let mut query = vec![("page", page.to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        let envelope: WatchlistEnvelope = self.get("watchlist", &query).await?;
        Ok(Page::new(
            envelope.watchlist.into_iter().map(WatchlistItem::from).collect(),
            envelope.pagination,
        ))
    }

    async fn add_watchlist_item(
        &self,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> ApiResult<WatchlistItem> {
        let body = WatchlistBody { movie_id: Some(movie_id), status };
        let envelope: WatchlistItemEnvelope = self.with_body(Method::POST, "watchlist", &body).await?;
        Ok(envelope.watchlist_item.into())
    }

    async fn remove_watchlist_item(&self, movie_id: &str) -> ApiResult<()> {
        let path = format!("watchlist/{}", segment(movie_id));
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn update_watchlist_status(
        &self,
        movie_id: &str,
        status: WatchlistStatus,
    ) -> ApiResult<WatchlistItem> {
        let path = format!("watchlist/{}", segment(movie_id));
        let body = WatchlistBody { movie_id: None, status };
        let envelope: WatchlistItemEnvelope = self.with_body(Method::PUT, &path, &body).await?;
        Ok(envelope.watchlist_item.into())
    }

    async fn fetch_watchlist_stats(&self) -> ApiResult<WatchlistStats> {
        let envelope: StatsEnvelope = self.get("watchlist/stats", &[]).await?;
        Ok(envelope.stats)
    }
}
