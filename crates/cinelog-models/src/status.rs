use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Watchlist status values as the catalog API spells them
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistStatus {
    /// Added to the list, not started
    #[default]
    WantToWatch,
    Watching,
    Watched,
}

impl WatchlistStatus {
    pub const ALL: [WatchlistStatus; 3] = [
        WatchlistStatus::WantToWatch,
        WatchlistStatus::Watching,
        WatchlistStatus::Watched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchlistStatus::WantToWatch => "want_to_watch",
            WatchlistStatus::Watching => "watching",
            WatchlistStatus::Watched => "watched",
        }
    }
}

impl fmt::Display for WatchlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WatchlistStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "want_to_watch" => Ok(WatchlistStatus::WantToWatch),
            "watching" => Ok(WatchlistStatus::Watching),
            "watched" => Ok(WatchlistStatus::Watched),
            other => Err(format!(
                "Invalid watchlist status: {}. Use 'want_to_watch', 'watching', or 'watched'",
                other
            )),
        }
    }
}
