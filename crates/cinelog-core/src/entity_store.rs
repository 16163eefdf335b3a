//! Keyed storage for the three cached entity kinds
//!
//! Each kind lives in a [`Collection`]: records by id plus the visible
//! order of the list the UI renders. Fetched lists replace a collection
//! wholesale; acknowledged mutations upsert or remove single records.

use cinelog_models::{Movie, Review, WatchlistItem};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Movie,
    Review,
    WatchlistItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Movie => "movie",
            EntityKind::Review => "review",
            EntityKind::WatchlistItem => "watchlist item",
        };
        write!(f, "{}", name)
    }
}

/// A record the entity store can hold
pub trait Entity: Clone {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn collection(store: &EntityStore) -> &Collection<Self>;
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;
}

impl Entity for Movie {
    const KIND: EntityKind = EntityKind::Movie;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.movies
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.movies
    }
}

impl Entity for Review {
    const KIND: EntityKind = EntityKind::Review;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.reviews
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.reviews
    }
}

impl Entity for WatchlistItem {
    const KIND: EntityKind = EntityKind::WatchlistItem;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.watchlist
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.watchlist
    }
}

/// Records by id plus the order they are listed in
#[derive(Debug, Clone)]
pub struct Collection<T> {
    records: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in visible order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn find<P>(&self, predicate: P) -> Option<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().find(|item| predicate(item))
    }

    /// Replace by id. Ids not seen before go to the front, keeping batch order.
    pub fn upsert_many<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut fresh = Vec::new();
        for item in items {
            let id = item.id().to_string();
            if self.records.insert(id.clone(), item).is_none() && !fresh.contains(&id) {
                fresh.push(id);
            }
        }
        if !fresh.is_empty() {
            fresh.extend(self.order.drain(..));
            self.order = fresh;
        }
    }

    /// Replace a record only if it is already listed; returns whether it was
    pub fn replace_existing(&mut self, item: T) -> bool {
        match self.records.get_mut(item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Apply an in-place edit to a listed record
    pub fn update<F>(&mut self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.records.get_mut(id) {
            Some(item) => {
                edit(item);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// Replace the whole listing with a freshly fetched one
    ///
    /// Duplicate ids keep their first position and the last record.
    pub fn replace_all<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.records.clear();
        self.order.clear();
        for item in items {
            let id = item.id().to_string();
            if self.records.insert(id.clone(), item).is_none() {
                self.order.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }
}

/// Movies, movie reviews and watchlist items currently cached
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    movies: Collection<Movie>,
    reviews: Collection<Review>,
    watchlist: Collection<WatchlistItem>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Entity>(&self, id: &str) -> Result<&T, StoreError> {
        T::collection(self).get(id).ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    pub fn upsert_many<T: Entity>(&mut self, items: impl IntoIterator<Item = T>) {
        T::collection_mut(self).upsert_many(items);
    }

    pub fn remove<T: Entity>(&mut self, id: &str) -> Option<T> {
        T::collection_mut(self).remove(id)
    }

    pub fn replace_collection<T: Entity>(&mut self, items: impl IntoIterator<Item = T>) {
        T::collection_mut(self).replace_all(items);
    }

    pub fn collection<T: Entity>(&self) -> &Collection<T> {
        T::collection(self)
    }

    pub fn collection_mut<T: Entity>(&mut self) -> &mut Collection<T> {
        T::collection_mut(self)
    }

    pub fn list<T: Entity>(&self) -> Vec<T> {
        T::collection(self).to_vec()
    }

    /// The watchlist entry for a movie, if the movie is on the loaded list
    pub fn watchlist_entry(&self, movie_id: &str) -> Option<&WatchlistItem> {
        self.watchlist.find(|item| item.movie_id == movie_id)
    }
}
