pub mod api;
pub mod auth;
pub mod client;

pub use auth::AuthSession;
pub use client::HttpCatalogApi;
