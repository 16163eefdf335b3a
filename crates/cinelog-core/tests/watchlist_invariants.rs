//! Property tests for the watchlist reducer steps of `CatalogState`
//!
//! Random sequences of adds, removes, status changes and page loads must
//! keep the status map mirroring the loaded items, and locally counted
//! totals matching them, after every single step.

use chrono::Utc;
use cinelog_core::state::CatalogState;
use cinelog_core::{Operation, StatsSource, StatsUpdate};
use cinelog_models::{Page, PageInfo, WatchlistItem, WatchlistStats, WatchlistStatus};
use proptest::prelude::*;
use std::collections::BTreeMap;

const MOVIES: u8 = 6;

#[derive(Debug, Clone)]
enum Op {
    /// Add a movie; `fresh_id` makes the server hand back a new entry id
    Add { movie: u8, status: WatchlistStatus, fresh_id: bool },
    Remove { movie: u8 },
    SetStatus { movie: u8, status: WatchlistStatus },
    /// Replace the loaded page; `partial` loads one page of several without totals
    Load { entries: Vec<(u8, WatchlistStatus)>, partial: bool },
}

fn status_strategy() -> impl Strategy<Value = WatchlistStatus> {
    prop::sample::select(WatchlistStatus::ALL.to_vec())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..MOVIES, status_strategy(), any::<bool>())
            .prop_map(|(movie, status, fresh_id)| Op::Add { movie, status, fresh_id }),
        2 => (0..MOVIES).prop_map(|movie| Op::Remove { movie }),
        2 => (0..MOVIES, status_strategy()).prop_map(|(movie, status)| Op::SetStatus { movie, status }),
        1 => (prop::collection::vec((0..MOVIES, status_strategy()), 0..8), any::<bool>())
            .prop_map(|(entries, partial)| Op::Load { entries, partial }),
    ]
}

fn movie_id(movie: u8) -> String {
    format!("m{}", movie)
}

fn item(id: String, movie: u8, status: WatchlistStatus) -> WatchlistItem {
    WatchlistItem {
        id,
        movie_id: movie_id(movie),
        movie: None,
        status,
        created_at: Utc::now(),
    }
}

fn apply(state: &mut CatalogState, op: &Op, step: usize) {
    match op {
        Op::Add { movie, status, fresh_id } => {
            let id = if *fresh_id {
                format!("w{}-{}", movie, step)
            } else {
                format!("w{}", movie)
            };
            let ticket = state.begin_watchlist_change(&movie_id(*movie), Some(*status)).unwrap();
            state
                .commit_watchlist_add(ticket, Operation::AddToWatchlist, item(id, *movie, *status))
                .unwrap();
        }
        Op::Remove { movie } => {
            let ticket = state.begin_watchlist_change(&movie_id(*movie), None).unwrap();
            state
                .commit_watchlist_remove(ticket, Operation::RemoveFromWatchlist, &movie_id(*movie))
                .unwrap();
        }
        Op::SetStatus { movie, status } => {
            let ticket = state.begin_watchlist_change(&movie_id(*movie), Some(*status)).unwrap();
            state
                .commit_watchlist_status(ticket, item(format!("w{}", movie), *movie, *status))
                .unwrap();
        }
        Op::Load { entries, partial } => {
            // The server lists a movie at most once
            let unique: BTreeMap<u8, WatchlistStatus> = entries.iter().copied().collect();
            let items: Vec<WatchlistItem> = unique
                .into_iter()
                .map(|(movie, status)| item(format!("w{}", movie), movie, status))
                .collect();
            let (info, stats) = if *partial {
                (PageInfo::new(1, 3, 20), StatsUpdate::Keep)
            } else {
                (PageInfo::new(1, 1, items.len() as u32), StatsUpdate::Recompute)
            };
            state.load_watchlist(Page::new(items, info), stats);
        }
    }
}

proptest! {
    #[test]
    fn watchlist_stays_consistent_after_every_step(
        ops in prop::collection::vec(op_strategy(), 1..60)
    ) {
        let mut state = CatalogState::new();
        for (step, op) in ops.iter().enumerate() {
            apply(&mut state, op, step);

            let snapshot = state.snapshot();
            prop_assert!(state.is_consistent(), "inconsistent after {:?}", op);
            prop_assert_eq!(snapshot.stats_source, StatsSource::Local);
            prop_assert_eq!(snapshot.watchlist_stats.total as usize, snapshot.watchlist_items.len());
            prop_assert_eq!(
                snapshot.watchlist_stats,
                WatchlistStats::from_items(&snapshot.watchlist_items)
            );
            prop_assert_eq!(snapshot.watchlist_status_map.len(), snapshot.watchlist_items.len());
            prop_assert!(snapshot.pending_keys.is_empty());
        }
    }

    #[test]
    fn removing_every_movie_empties_the_watchlist(
        ops in prop::collection::vec(op_strategy(), 0..40)
    ) {
        let mut state = CatalogState::new();
        for (step, op) in ops.iter().enumerate() {
            apply(&mut state, op, step);
        }
        for movie in 0..MOVIES {
            apply(&mut state, &Op::Remove { movie }, ops.len());
        }

        let snapshot = state.snapshot();
        prop_assert!(snapshot.watchlist_items.is_empty());
        prop_assert!(snapshot.watchlist_status_map.is_empty());
        prop_assert_eq!(snapshot.watchlist_stats, WatchlistStats::default());
    }
}
