//! In-memory keyed collection and entity store

use crate::core::entity::{Entity, EntityId};
use crate::core::error::StoreError;
use crate::core::store::{BaseCollection, EntitySource, EntityStore, KeyedCollection};
use crate::reactive::{BehaviorSubject, Observable};
use indexmap::IndexMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

/// In-memory keyed collection
///
/// Backed by an insertion-ordered map behind a `RwLock`; every mutation
/// republishes the full value list to `select_all` listeners, after the lock
/// is released.
#[derive(Clone)]
pub struct InMemoryCollection<K, V> {
    name: String,
    items: Arc<RwLock<IndexMap<K, V>>>,
    changes: BehaviorSubject<Vec<V>>,
}

impl<K, V> std::fmt::Debug for InMemoryCollection<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCollection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<K, V> InMemoryCollection<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new, empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Arc::new(RwLock::new(IndexMap::new())),
            changes: BehaviorSubject::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keyed snapshot in insertion order
    pub fn snapshot(&self) -> IndexMap<K, V> {
        self.items
            .read()
            .map(|items| items.clone())
            .unwrap_or_default()
    }

    /// Replace the whole content
    pub fn set_all(&self, entries: Vec<(K, V)>) -> Result<(), StoreError> {
        let values = {
            let mut items = self.write()?;
            *items = entries.into_iter().collect();
            items.values().cloned().collect()
        };
        self.changes.next(values);
        Ok(())
    }

    /// Stop publishing changes; listeners are released
    pub fn complete(&self) {
        self.changes.complete();
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, IndexMap<K, V>>, StoreError> {
        self.items.write().map_err(|e| StoreError::LockPoisoned {
            store: self.name.clone(),
            message: e.to_string(),
        })
    }

    fn publish(&self, values: Vec<V>) {
        self.changes.next(values);
    }
}

impl<K, V> KeyedCollection<K, V> for InMemoryCollection<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn upsert(&self, key: K, value: V) -> Result<Option<V>, StoreError> {
        let (previous, values) = {
            let mut items = self.write()?;
            let previous = items.insert(key, value);
            (previous, items.values().cloned().collect())
        };
        self.publish(values);
        Ok(previous)
    }

    fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        let (removed, values) = {
            let mut items = self.write()?;
            let Some(removed) = items.shift_remove(key) else {
                return Ok(None);
            };
            (removed, items.values().cloned().collect())
        };
        self.publish(values);
        Ok(Some(removed))
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let count = {
            let mut items = self.write()?;
            let count = items.len();
            items.clear();
            count
        };
        self.publish(Vec::new());
        Ok(count)
    }

    fn get(&self, key: &K) -> Option<V> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn values(&self) -> Vec<V> {
        self.items
            .read()
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    fn select_all(&self) -> Observable<Vec<V>> {
        self.changes.as_observable()
    }

    fn close(&self) {
        self.complete();
    }
}

/// In-memory entity store
///
/// Useful for testing and development, and as the base store of a data
/// source when entities live in the process. Emits either a list or a keyed
/// map from `select_all`, depending on how it was built.
#[derive(Clone, Debug)]
pub struct InMemoryEntityStore<E> {
    collection: InMemoryCollection<EntityId, E>,
    keyed: bool,
}

impl<E: Entity> InMemoryEntityStore<E> {
    /// Create a store emitting ordered lists
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            collection: InMemoryCollection::new(name),
            keyed: false,
        }
    }

    /// Create a store emitting keyed maps
    pub fn keyed(name: impl Into<String>) -> Self {
        Self {
            collection: InMemoryCollection::new(name),
            keyed: true,
        }
    }

    /// Create a store pre-filled with `entities`
    pub fn with_entities(name: impl Into<String>, entities: Vec<E>) -> Result<Self, StoreError> {
        let store = Self::new(name);
        store.set(entities)?;
        Ok(store)
    }

    /// Replace every entity at once (single emission)
    pub fn set(&self, entities: Vec<E>) -> Result<(), StoreError> {
        let entries = entities
            .into_iter()
            .map(|e| Ok((self.key_of(&e)?, e)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.collection.set_all(entries)?;
        tracing::debug!(store = %self.collection.name(), "Store content replaced");
        Ok(())
    }

    /// Insert or replace by id
    pub fn upsert(&self, entity: E) -> Result<(), StoreError> {
        self.collection.upsert(self.key_of(&entity)?, entity)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Entities without an id would all collapse onto one key
    fn key_of(&self, entity: &E) -> Result<EntityId, StoreError> {
        let id = entity.id();
        if id.is_blank() {
            return Err(StoreError::MissingId {
                store: self.collection.name().to_string(),
            });
        }
        Ok(id)
    }

    fn not_found(&self, id: &EntityId) -> StoreError {
        StoreError::NotFound {
            store: self.collection.name().to_string(),
            id: id.to_string(),
        }
    }
}

impl<E: Entity> EntitySource<E> for InMemoryEntityStore<E> {
    fn select_all(&self) -> Observable<BaseCollection<E>> {
        let keyed = self.keyed;
        self.collection.select_all().map(move |entities: &Vec<E>| {
            if keyed {
                BaseCollection::Keyed(entities.iter().map(|e| (e.id(), e.clone())).collect())
            } else {
                BaseCollection::List(entities.clone())
            }
        })
    }
}

impl<E: Entity> EntityStore<E> for InMemoryEntityStore<E> {
    fn store_name(&self) -> &str {
        self.collection.name()
    }

    fn add(&self, entity: E) -> Result<(), StoreError> {
        let id = self.key_of(&entity)?;
        if self.collection.get(&id).is_some() {
            return Err(StoreError::AlreadyExists {
                store: self.collection.name().to_string(),
                id: id.to_string(),
            });
        }
        self.collection.upsert(id.clone(), entity)?;
        tracing::debug!(store = %self.collection.name(), id = %id, "Entity added");
        Ok(())
    }

    fn update(&self, entity: E) -> Result<E, StoreError> {
        let id = self.key_of(&entity)?;
        if self.collection.get(&id).is_none() {
            return Err(self.not_found(&id));
        }
        self.collection.upsert(id.clone(), entity.clone())?;
        tracing::debug!(store = %self.collection.name(), id = %id, "Entity updated");
        Ok(entity)
    }

    fn remove(&self, id: &EntityId) -> Result<Option<E>, StoreError> {
        let removed = self.collection.remove(id)?;
        if removed.is_some() {
            tracing::debug!(store = %self.collection.name(), id = %id, "Entity removed");
        }
        Ok(removed)
    }

    fn select_by_id(&self, id: &EntityId) -> Observable<Option<E>> {
        let id = id.clone();
        self.collection
            .select_all()
            .map(move |entities: &Vec<E>| entities.iter().find(|e| e.id() == id).cloned())
    }

    fn get_all(&self) -> Vec<E> {
        self.collection.values()
    }

    fn get_by_id(&self, id: &EntityId) -> Option<E> {
        self.collection.get(id)
    }
}
