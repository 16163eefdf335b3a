//! Derived watchlist aggregates
//!
//! Holds the movie to status map and the per-status counters. Every
//! watchlist change in the store goes through one of the `on_*` hooks so
//! both stay in step with the loaded items.

use cinelog_models::{MovieId, WatchlistItem, WatchlistStats, WatchlistStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Where the current counters came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// Counted from the loaded items
    #[default]
    Local,
    /// Reported by the server, covers items that are not loaded
    Server,
}

/// How a bulk load should treat the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsUpdate {
    /// The page is the whole watchlist, count its items
    Recompute,
    /// Take the server's totals
    Server(WatchlistStats),
    /// Partial page without fresh totals
    ///
    /// Server totals already held stay as they are. Local counters have
    /// nothing to vouch for them, so they are recounted from the page.
    Keep,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateTracker {
    status_map: BTreeMap<MovieId, WatchlistStatus>,
    stats: WatchlistStats,
    source: StatsSource,
}

impl AggregateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_of(&self, movie_id: &str) -> Option<WatchlistStatus> {
        self.status_map.get(movie_id).copied()
    }

    pub fn status_map(&self) -> &BTreeMap<MovieId, WatchlistStatus> {
        &self.status_map
    }

    pub fn stats(&self) -> WatchlistStats {
        self.stats
    }

    pub fn source(&self) -> StatsSource {
        self.source
    }

    pub fn on_watchlist_add(&mut self, item: &WatchlistItem) {
        match self.status_map.insert(item.movie_id.clone(), item.status) {
            // Re-adding a tracked movie is a status change, not a new entry
            Some(previous) => self.stats.move_between(previous, item.status),
            None => self.stats.increment(item.status),
        }
    }

    /// Untrack a movie. Removing one that is not tracked changes nothing.
    pub fn on_watchlist_remove(&mut self, movie_id: &str) {
        if let Some(status) = self.status_map.remove(movie_id) {
            self.stats.decrement(status);
        }
    }

    /// Move a tracked movie between statuses. Untracked movies are ignored.
    pub fn on_watchlist_status_change(
        &mut self,
        movie_id: &str,
        old: WatchlistStatus,
        new: WatchlistStatus,
    ) {
        if let Some(current) = self.status_map.get_mut(movie_id) {
            *current = new;
            self.stats.move_between(old, new);
        }
    }

    /// Rebuild the status map from a freshly loaded set of items
    pub fn on_watchlist_bulk_load(&mut self, items: &[WatchlistItem], stats: StatsUpdate) {
        self.status_map = items
            .iter()
            .map(|item| (item.movie_id.clone(), item.status))
            .collect();

        match stats {
            StatsUpdate::Recompute => {
                self.stats = WatchlistStats::from_items(items);
                self.source = StatsSource::Local;
            }
            StatsUpdate::Server(stats) => self.set_server_stats(stats),
            StatsUpdate::Keep => {
                if self.source == StatsSource::Local {
                    self.stats = WatchlistStats::from_items(items);
                }
            }
        }
        debug!(
            "Watchlist aggregates rebuilt from {} items ({:?} counters)",
            items.len(),
            self.source
        );
    }

    pub fn set_server_stats(&mut self, stats: WatchlistStats) {
        self.stats = stats;
        self.source = StatsSource::Server;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether the map and the counters agree with `items`
    ///
    /// The map must mirror the items exactly. Counters are only compared
    /// when they were counted locally.
    pub fn is_consistent_with(&self, items: &[WatchlistItem]) -> bool {
        let expected: BTreeMap<&str, WatchlistStatus> = items
            .iter()
            .map(|item| (item.movie_id.as_str(), item.status))
            .collect();
        let map_matches = expected.len() == self.status_map.len()
            && self
                .status_map
                .iter()
                .all(|(movie_id, status)| expected.get(movie_id.as_str()) == Some(status));

        match self.source {
            StatsSource::Local => map_matches && self.stats == WatchlistStats::from_items(items),
            StatsSource::Server => map_matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(movie_id: &str, status: WatchlistStatus) -> WatchlistItem {
        WatchlistItem {
            id: format!("w-{}", movie_id),
            movie_id: movie_id.to_string(),
            movie: None,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_on_empty() {
        let mut tracker = AggregateTracker::new();
        let added = item("m1", WatchlistStatus::WantToWatch);
        tracker.on_watchlist_add(&added);

        assert_eq!(tracker.status_of("m1"), Some(WatchlistStatus::WantToWatch));
        assert_eq!(tracker.stats().want_to_watch, 1);
        assert_eq!(tracker.stats().total, 1);
        assert!(tracker.is_consistent_with(&[added]));
    }

    #[test]
    fn test_readd_counts_as_status_change() {
        let mut tracker = AggregateTracker::new();
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::WantToWatch));
        let again = item("m1", WatchlistStatus::Watched);
        tracker.on_watchlist_add(&again);

        assert_eq!(tracker.stats().total, 1);
        assert_eq!(tracker.stats().watched, 1);
        assert_eq!(tracker.stats().want_to_watch, 0);
        assert!(tracker.is_consistent_with(&[again]));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut tracker = AggregateTracker::new();
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::Watching));
        tracker.on_watchlist_remove("m1");
        let after_first = (tracker.status_map().clone(), tracker.stats());
        tracker.on_watchlist_remove("m1");

        assert_eq!((tracker.status_map().clone(), tracker.stats()), after_first);
        assert_eq!(tracker.stats(), WatchlistStats::default());
        assert!(tracker.is_consistent_with(&[]));
    }

    #[test]
    fn test_status_change_moves_counters() {
        let mut tracker = AggregateTracker::new();
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::WantToWatch));
        tracker.on_watchlist_status_change("m1", WatchlistStatus::WantToWatch, WatchlistStatus::Watched);

        let stats = tracker.stats();
        assert_eq!((stats.want_to_watch, stats.watched, stats.total), (0, 1, 1));
        assert!(tracker.is_consistent_with(&[item("m1", WatchlistStatus::Watched)]));
    }

    #[test]
    fn test_bulk_load_complete_page_recomputes() {
        let mut tracker = AggregateTracker::new();
        tracker.set_server_stats(WatchlistStats { want_to_watch: 9, watching: 9, watched: 9, total: 27 });
        let items = vec![item("m1", WatchlistStatus::Watched), item("m2", WatchlistStatus::Watched)];
        tracker.on_watchlist_bulk_load(&items, StatsUpdate::Recompute);

        assert_eq!(tracker.source(), StatsSource::Local);
        assert_eq!(tracker.stats().watched, 2);
        assert_eq!(tracker.stats().total, 2);
        assert!(tracker.is_consistent_with(&items));
    }

    #[test]
    fn test_bulk_load_partial_page_trusts_server() {
        let mut tracker = AggregateTracker::new();
        let items = vec![item("m1", WatchlistStatus::Watching)];
        let server = WatchlistStats { want_to_watch: 10, watching: 4, watched: 11, total: 25 };
        tracker.on_watchlist_bulk_load(&items, StatsUpdate::Server(server));

        assert_eq!(tracker.source(), StatsSource::Server);
        assert_eq!(tracker.stats(), server);
        assert_eq!(tracker.status_map().len(), 1);
        assert!(tracker.is_consistent_with(&items));
    }

    #[test]
    fn test_bulk_load_keep_recounts_local_counters() {
        let mut tracker = AggregateTracker::new();
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::Watching));
        let items = vec![item("m2", WatchlistStatus::Watched), item("m3", WatchlistStatus::Watched)];
        tracker.on_watchlist_bulk_load(&items, StatsUpdate::Keep);

        assert_eq!(tracker.source(), StatsSource::Local);
        assert_eq!(tracker.stats().watching, 0);
        assert_eq!(tracker.stats().watched, 2);
        assert_eq!(tracker.stats().total, 2);
        assert!(tracker.is_consistent_with(&items));
    }

    #[test]
    fn test_bulk_load_keep_preserves_server_totals() {
        let mut tracker = AggregateTracker::new();
        let server = WatchlistStats { want_to_watch: 10, watching: 4, watched: 11, total: 25 };
        tracker.set_server_stats(server);
        let items = vec![item("m2", WatchlistStatus::Watched)];
        tracker.on_watchlist_bulk_load(&items, StatsUpdate::Keep);

        assert_eq!(tracker.source(), StatsSource::Server);
        assert_eq!(tracker.stats(), server);
        assert!(tracker.is_consistent_with(&items));
    }

    #[test]
    fn test_status_change_of_untracked_movie_is_ignored() {
        let mut tracker = AggregateTracker::new();
        let server = WatchlistStats { want_to_watch: 1, watching: 0, watched: 2, total: 3 };
        tracker.set_server_stats(server);
        tracker.on_watchlist_status_change("m9", WatchlistStatus::WantToWatch, WatchlistStatus::Watching);

        assert_eq!(tracker.stats(), server);
        assert!(tracker.status_map().is_empty());
    }

    #[test]
    fn test_inconsistency_is_detected() {
        let mut tracker = AggregateTracker::new();
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::Watching));

        assert!(!tracker.is_consistent_with(&[item("m1", WatchlistStatus::Watched)]));
        assert!(!tracker.is_consistent_with(&[]));
    }

    #[test]
    fn test_clear() {
        let mut tracker = AggregateTracker::new();
        tracker.set_server_stats(WatchlistStats { want_to_watch: 1, watching: 0, watched: 0, total: 1 });
        tracker.on_watchlist_add(&item("m1", WatchlistStatus::WantToWatch));
        tracker.clear();

        assert!(tracker.status_map().is_empty());
        assert_eq!(tracker.stats(), WatchlistStats::default());
        assert_eq!(tracker.source(), StatsSource::Local);
    }
}
