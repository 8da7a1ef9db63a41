//! Store traits consumed by the filters
//!
//! The filters never own entity data. They read it through [`EntitySource`]
//! and keep their own state in a [`KeyedCollection`].

use crate::core::entity::{Entity, EntityId};
use crate::core::error::StoreError;
use crate::reactive::Observable;
use indexmap::IndexMap;

/// Snapshot of a base collection, either as a sequence or keyed by id
#[derive(Debug, Clone, PartialEq)]
pub enum BaseCollection<E> {
    List(Vec<E>),
    Keyed(IndexMap<EntityId, E>),
}

impl<E: Clone> BaseCollection<E> {
    /// Normalize to an ordered sequence (keyed maps keep insertion order)
    pub fn to_vec(&self) -> Vec<E> {
        match self {
            BaseCollection::List(items) => items.clone(),
            BaseCollection::Keyed(map) => map.values().cloned().collect(),
        }
    }

    pub fn into_vec(self) -> Vec<E> {
        match self {
            BaseCollection::List(items) => items,
            BaseCollection::Keyed(map) => map.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BaseCollection::List(items) => items.len(),
            BaseCollection::Keyed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> From<Vec<E>> for BaseCollection<E> {
    fn from(items: Vec<E>) -> Self {
        BaseCollection::List(items)
    }
}

impl<E> From<IndexMap<EntityId, E>> for BaseCollection<E> {
    fn from(map: IndexMap<EntityId, E>) -> Self {
        BaseCollection::Keyed(map)
    }
}

/// Generic keyed collection with a reactive "select all"
///
/// Values keep the position of their first insertion; replacing a value
/// under an existing key does not move it.
pub trait KeyedCollection<K, V>: Send + Sync {
    /// Insert or replace, returning the previous value
    fn upsert(&self, key: K, value: V) -> Result<Option<V>, StoreError>;

    /// Remove a value; `Ok(None)` when the key is unknown
    fn remove(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Remove everything, returning how many values were dropped
    fn clear(&self) -> Result<usize, StoreError>;

    /// Point lookup
    fn get(&self, key: &K) -> Option<V>;

    /// Current values in insertion order
    fn values(&self) -> Vec<V>;

    /// Current values, then every subsequent change
    fn select_all(&self) -> Observable<Vec<V>>;

    /// Stop publishing changes and release listeners
    fn close(&self) {}
}

/// Anything that can stream the base entity collection
pub trait EntitySource<E>: Send + Sync {
    /// Current collection, then every subsequent change
    fn select_all(&self) -> Observable<BaseCollection<E>>;
}

/// Reactive entity store contract: add, update, remove, select-all, select-by-id
pub trait EntityStore<E: Entity>: EntitySource<E> {
    /// Name of the store, used for logs and derived registry names
    fn store_name(&self) -> &str;

    /// Add a new entity; fails if its id is already stored
    fn add(&self, entity: E) -> Result<(), StoreError>;

    /// Replace an existing entity; fails if its id is unknown
    fn update(&self, entity: E) -> Result<E, StoreError>;

    /// Remove an entity; `Ok(None)` when the id is unknown
    fn remove(&self, id: &EntityId) -> Result<Option<E>, StoreError>;

    /// Stream one entity (or `None` while it is absent)
    fn select_by_id(&self, id: &EntityId) -> Observable<Option<E>>;

    /// Current entities in insertion order
    fn get_all(&self) -> Vec<E>;

    /// Point lookup
    fn get_by_id(&self, id: &EntityId) -> Option<E>;
}
