use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::movie::Movie;
use crate::status::WatchlistStatus;
use crate::{MovieId, WatchlistItemId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    #[serde(alias = "_id")]
    pub id: WatchlistItemId,
    pub movie_id: MovieId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie: Option<Movie>, // Populated movie record when the server includes it
    pub status: WatchlistStatus,
    pub created_at: DateTime<Utc>,
}

/// Per-status watchlist totals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WatchlistStats {
    #[serde(default)]
    pub want_to_watch: u32,
    #[serde(default)]
    pub watching: u32,
    #[serde(default)]
    pub watched: u32,
    #[serde(default)]
    pub total: u32,
}

impl WatchlistStats {
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a WatchlistItem>,
    {
        let mut stats = Self::default();
        for item in items {
            stats.increment(item.status);
        }
        stats
    }

    pub fn count(&self, status: WatchlistStatus) -> u32 {
        match status {
            WatchlistStatus::WantToWatch => self.want_to_watch,
            WatchlistStatus::Watching => self.watching,
            WatchlistStatus::Watched => self.watched,
        }
    }

    fn slot(&mut self, status: WatchlistStatus) -> &mut u32 {
        match status {
            WatchlistStatus::WantToWatch => &mut self.want_to_watch,
            WatchlistStatus::Watching => &mut self.watching,
            WatchlistStatus::Watched => &mut self.watched,
        }
    }

    pub fn increment(&mut self, status: WatchlistStatus) {
        *self.slot(status) += 1;
        self.total += 1;
    }

    /// Saturates at zero so server-sourced totals never underflow
    pub fn decrement(&mut self, status: WatchlistStatus) {
        let slot = self.slot(status);
        *slot = slot.saturating_sub(1);
        self.total = self.total.saturating_sub(1);
    }

    pub fn move_between(&mut self, from: WatchlistStatus, to: WatchlistStatus) {
        if from == to {
            return;
        }
        let old = self.slot(from);
        *old = old.saturating_sub(1);
        *self.slot(to) += 1;
    }
}
