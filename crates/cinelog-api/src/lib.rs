pub mod error;
pub mod http;
pub mod traits;

pub use error::{ApiError, ApiResult};
pub use http::{AuthSession, HttpCatalogApi};
pub use traits::CatalogApi;
