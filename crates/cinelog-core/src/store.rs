use cinelog_api::CatalogApi;
use cinelog_config::CatalogOptions;
use cinelog_models::{User, WatchlistStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};
use crate::snapshot::Snapshot;
use crate::state::{CatalogState, Epoch};

/// Behaviour knobs taken from the `[catalog]` config section
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub default_watchlist_status: WatchlistStatus,
    pub refresh_stats_on_partial_page: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::from(&CatalogOptions::default())
    }
}

impl From<&CatalogOptions> for StoreOptions {
    fn from(options: &CatalogOptions) -> Self {
        Self {
            default_watchlist_status: options.default_watchlist_status,
            refresh_stats_on_partial_page: options.refresh_stats_on_partial_page,
        }
    }
}

type Listener = Arc<dyn Fn(Arc<Snapshot>) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

struct Inner {
    state: CatalogState,
    snapshot: Arc<Snapshot>,
}

struct Shared<A> {
    api: Arc<A>,
    options: StoreOptions,
    inner: Mutex<Inner>,
    listeners: Arc<Mutex<ListenerRegistry>>,
}

/// Client-side cache of catalog, review and watchlist state
///
/// Cloning is cheap and every clone shares the same state. Reads go
/// through [`CatalogStore::get_snapshot`]; changes go through the dispatch
/// methods, see the `coordinator` module.
pub struct CatalogStore<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for CatalogStore<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Reducer steps can't leave the state half-applied, so a poisoned lock is still usable
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: CatalogApi> CatalogStore<A> {
    pub fn new(api: A) -> Self {
        Self::with_options(Arc::new(api), StoreOptions::default())
    }

    pub fn with_options(api: Arc<A>, options: StoreOptions) -> Self {
        let state = CatalogState::new();
        let snapshot = Arc::new(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                api,
                options,
                inner: Mutex::new(Inner { state, snapshot }),
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub fn options(&self) -> &StoreOptions {
        &self.shared.options
    }

    pub fn get_snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&lock(&self.shared.inner).snapshot)
    }

    /// Register a listener called with every new snapshot
    ///
    /// Listeners run on the dispatching task after the lock is released.
    /// Snapshots from concurrent steps may arrive out of order; compare
    /// `version` to drop older ones.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Arc<Snapshot>) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.shared.listeners);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.insert(id, Arc::new(listener));
        debug!("Listener {} subscribed ({} total)", id, registry.listeners.len());
        Subscription {
            id,
            registry: Arc::downgrade(&self.shared.listeners),
        }
    }

    pub(crate) fn epoch(&self) -> Epoch {
        lock(&self.shared.inner).state.epoch()
    }

    pub(crate) fn read<R>(&self, query: impl FnOnce(&CatalogState) -> R) -> R {
        query(&lock(&self.shared.inner).state)
    }

    /// Run one reducer step under the lock, publish the new snapshot, then notify
    pub(crate) fn update<R>(&self, step: impl FnOnce(&mut CatalogState) -> R) -> R {
        let (result, snapshot) = {
            let mut inner = lock(&self.shared.inner);
            let result = step(&mut inner.state);
            debug_assert!(
                inner.state.is_consistent(),
                "watchlist aggregates diverged from the loaded items"
            );
            inner.state.bump_version();
            let snapshot = Arc::new(inner.state.snapshot());
            inner.snapshot = Arc::clone(&snapshot);
            (result, snapshot)
        };
        self.notify(snapshot);
        result
    }

    fn notify(&self, snapshot: Arc<Snapshot>) {
        let listeners: Vec<Listener> = lock(&self.shared.listeners).listeners.values().cloned().collect();
        for listener in listeners {
            listener(Arc::clone(&snapshot));
        }
    }

    /// Drop all cached state, e.g. on logout
    pub fn reset(&self) {
        info!("Resetting catalog store");
        self.update(CatalogState::reset);
    }

    pub fn set_session_user(&self, user: Option<User>) {
        self.update(|state| state.set_session_user(user));
    }

    pub fn clear_error(&self) {
        self.update(CatalogState::clear_error);
    }

    pub fn clear_current_movie(&self) {
        self.update(CatalogState::clear_current_movie);
    }

    pub fn clear_search_results(&self) {
        self.update(CatalogState::clear_search_results);
    }
}

/// Handle returned by [`CatalogStore::subscribe`]; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
            debug!("Listener {} unsubscribed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalogApi;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_initial_snapshot_is_empty() {
        let store = CatalogStore::new(FakeCatalogApi::new());
        let snapshot = store.get_snapshot();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.movies.is_empty());
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn test_listeners_see_each_step_until_dropped() {
        let store = CatalogStore::new(FakeCatalogApi::new());
        let seen = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |snapshot| sink.store(snapshot.version, Ordering::SeqCst));

        store.clear_error();
        store.clear_search_results();
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        drop(subscription);
        store.clear_error();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(store.get_snapshot().version, 3);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let store = CatalogStore::new(FakeCatalogApi::new());
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        let subscription = store.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        store.clear_error();
        subscription.unsubscribe();
        store.clear_error();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_store() {
        let store = CatalogStore::new(FakeCatalogApi::new());
        let subscription = store.subscribe(|_| {});
        drop(store);
        drop(subscription);
    }

    #[test]
    fn test_clones_share_state() {
        let store = CatalogStore::new(FakeCatalogApi::new());
        let other = store.clone();
        other.set_session_user(Some(User {
            id: "u1".into(),
            username: "ada".into(),
            email: None,
            profile_picture: None,
            join_date: None,
        }));

        assert!(store.get_snapshot().is_authenticated());
    }

    #[test]
    fn test_options_from_config() {
        let options = StoreOptions::from(&CatalogOptions {
            default_watchlist_status: WatchlistStatus::Watching,
            refresh_stats_on_partial_page: false,
        });
        assert_eq!(options.default_watchlist_status, WatchlistStatus::Watching);
        assert!(!options.refresh_stats_on_partial_page);
    }
}
