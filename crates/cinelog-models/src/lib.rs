pub mod movie;
pub mod pagination;
pub mod review;
pub mod status;
pub mod user;
pub mod watchlist;

pub use movie::{Movie, MovieFilters, MovieSort};
pub use pagination::{Page, PageInfo};
pub use review::{Review, ReviewEdit, MAX_RATING, MIN_RATING};
pub use status::WatchlistStatus;
pub use user::User;
pub use watchlist::{WatchlistItem, WatchlistStats};

pub type MovieId = String;
pub type ReviewId = String;
pub type UserId = String;
pub type WatchlistItemId = String;
