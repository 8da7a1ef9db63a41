//! Filter registry
//!
//! A [`FiltersRegistry`] owns the filter set and the sort spec attached to one
//! base entity source, and exposes the filtered, sorted view of that source
//! as an [`Observable`].
//!
//! ```text
//!  set_filter / remove_filter / clear_filters ──▶ filters (KeyedCollection)
//!  set_sort_by / clear_sort ─────────────────────▶ sort (BehaviorSubject)
//!  base store ───────────────────────────────────▶ source.select_all()
//!                                                        │
//!                     combine_latest3 ──▶ run_pipeline ──▶ select_all_by_filters()
//! ```
//!
//! Every mutation runs inside the registry's [`Scheduler`] batch, so work
//! deferred by downstream listeners (pagination correction) happens once the
//! whole recompute has been delivered.

use crate::config::FiltersConfig;
use crate::core::entity::{Entity, EntityId};
use crate::core::error::{FiltersError, PredicateError, RegistryError};
use crate::core::events::{EventBus, FiltersEvent};
use crate::core::query::{NormalizeOptions, NormalizedFilters, SortBy};
use crate::core::store::{EntitySource, KeyedCollection};
use crate::filters::filter::{Filter, FilterDefaults, FilterId, FilterParams, create_filter_with};
use crate::filters::pipeline::run_pipeline;
use crate::reactive::{
    BehaviorSubject, Observable, Scheduler, Subject, Subscription, combine_latest2,
    combine_latest3, lock,
};
use crate::storage::InMemoryCollection;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Default registry name when the configuration does not provide one
pub const DEFAULT_REGISTRY_NAME: &str = "filters";

/// Filters and sort spec bound to one entity source
pub struct FiltersRegistry<E: Entity> {
    name: String,
    filters: Arc<dyn KeyedCollection<FilterId, Filter<E>>>,
    sort: BehaviorSubject<Option<SortBy>>,
    source: Arc<dyn EntitySource<E>>,
    defaults: FilterDefaults,
    scheduler: Scheduler,
    events: EventBus,
    errors: Subject<PredicateError>,
    server: Mutex<Option<Subscription>>,
    destroyed: AtomicBool,
}

impl<E: Entity> fmt::Debug for FiltersRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiltersRegistry")
            .field("name", &self.name)
            .field("filters", &self.filters.values().len())
            .field("sort", &self.sort.get())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> FiltersRegistry<E> {
    /// Create a registry with the default configuration
    pub fn new(source: Arc<dyn EntitySource<E>>) -> Self {
        Self::with_config(source, &FiltersConfig::default())
    }

    /// Create a registry backed by an in-memory filter collection
    pub fn with_config(source: Arc<dyn EntitySource<E>>, config: &FiltersConfig) -> Self {
        let name = config
            .store_name
            .clone()
            .unwrap_or_else(|| DEFAULT_REGISTRY_NAME.to_string());
        let collection = Arc::new(InMemoryCollection::new(name));
        Self::with_collection(source, collection, config)
    }

    /// Create a registry storing its filters in `collection`
    pub fn with_collection(
        source: Arc<dyn EntitySource<E>>,
        collection: Arc<dyn KeyedCollection<FilterId, Filter<E>>>,
        config: &FiltersConfig,
    ) -> Self {
        let name = config
            .store_name
            .clone()
            .unwrap_or_else(|| DEFAULT_REGISTRY_NAME.to_string());

        Self {
            name,
            filters: collection,
            sort: BehaviorSubject::new(None),
            source,
            defaults: config.filter_defaults(),
            scheduler: Scheduler::new(),
            events: EventBus::new(config.event_bus_capacity),
            errors: Subject::new(),
            server: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Batch scheduler shared with adapters bound to this registry
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Broadcast bus of registry mutations, for async observers
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Listeners currently attached to the sort stream
    ///
    /// Every live view of the registry holds one, so this drops back to zero
    /// once all views are unsubscribed.
    pub fn active_subscriptions(&self) -> usize {
        self.sort.observer_count()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create or replace a filter
    ///
    /// Replacing keeps the filter's position among filters of equal order.
    pub fn set_filter(&self, params: FilterParams<E>) -> Result<FilterId, FiltersError> {
        if self.is_destroyed() {
            return Err(RegistryError::Destroyed {
                name: self.name.clone(),
            }
            .into());
        }

        let filter = create_filter_with(params, &self.defaults)?;
        let id = filter.id.clone();

        let previous = self
            .scheduler
            .run(|| self.filters.upsert(id.clone(), filter))?;
        let replaced = previous.is_some();

        tracing::debug!(registry = %self.name, filter_id = %id, replaced, "Filter set");
        self.events.publish(FiltersEvent::FilterSet {
            registry: self.name.clone(),
            filter_id: id.to_string(),
            replaced,
        });
        Ok(id)
    }

    /// Remove a filter; unknown ids are ignored
    pub fn remove_filter(&self, id: impl Into<FilterId>) -> Result<(), FiltersError> {
        if self.is_destroyed() {
            return Ok(());
        }

        let id = id.into();
        let removed = self.scheduler.run(|| self.filters.remove(&id))?;
        if removed.is_some() {
            tracing::debug!(registry = %self.name, filter_id = %id, "Filter removed");
            self.events.publish(FiltersEvent::FilterRemoved {
                registry: self.name.clone(),
                filter_id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Remove every filter
    pub fn clear_filters(&self) -> Result<(), FiltersError> {
        if self.is_destroyed() {
            return Ok(());
        }
        self.clear()
    }

    /// Replace the sort spec
    pub fn set_sort_by(&self, sort: SortBy) {
        self.replace_sort(Some(sort));
    }

    /// Drop the sort spec; entities keep their base order
    pub fn clear_sort(&self) {
        self.replace_sort(None);
    }

    fn replace_sort(&self, sort: Option<SortBy>) {
        if self.is_destroyed() {
            return;
        }

        tracing::debug!(registry = %self.name, sort = ?sort, "Sort changed");
        self.scheduler.run(|| self.sort.next(sort.clone()));
        self.events.publish(FiltersEvent::SortChanged {
            registry: self.name.clone(),
            sort,
        });
    }

    fn clear(&self) -> Result<(), FiltersError> {
        let count = self.scheduler.run(|| self.filters.clear())?;
        tracing::debug!(registry = %self.name, count, "Filters cleared");
        self.events.publish(FiltersEvent::FiltersCleared {
            registry: self.name.clone(),
            count,
        });
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Value of a filter, `None` when the filter is unknown or has no value
    pub fn get_filter_value(&self, id: impl Into<FilterId>) -> Option<Value> {
        self.filters.get(&id.into()).and_then(|f| f.value)
    }

    pub fn get_filter(&self, id: impl Into<FilterId>) -> Option<Filter<E>> {
        self.filters.get(&id.into())
    }

    /// Visible filters, in ascending order
    pub fn get_filters(&self) -> Vec<Filter<E>> {
        visible_filters(&self.filters.values())
    }

    /// Every filter, hidden ones included, in insertion order
    pub fn get_all_filters(&self) -> Vec<Filter<E>> {
        self.filters.values()
    }

    /// Visible filters, now and after every change
    pub fn select_filters(&self) -> Observable<Vec<Filter<E>>> {
        self.filters.select_all().map(|all| visible_filters(all))
    }

    pub fn get_sort_value(&self) -> Option<SortBy> {
        self.sort.get()
    }

    pub fn select_sort_by(&self) -> Observable<Option<SortBy>> {
        self.sort.as_observable()
    }

    /// Predicate failures raised while computing the filtered view
    pub fn select_errors(&self) -> Observable<PredicateError> {
        self.errors.as_observable()
    }

    /// Filtered and sorted entities
    ///
    /// Emits on subscribe, then whenever the filters, the sort spec or the
    /// base collection change.
    pub fn select_all_by_filters(&self) -> Observable<Vec<E>> {
        let name = self.name.clone();
        let errors = self.errors.clone();

        combine_latest3(
            &self.filters.select_all(),
            &self.sort.as_observable(),
            &self.source.select_all(),
        )
        .map(move |(filters, sort, base)| {
            let output = run_pipeline(base, filters, sort.as_ref());
            for error in output.errors {
                tracing::warn!(
                    registry = %name,
                    filter_id = %error.filter_id,
                    index = error.index,
                    error = %error.message,
                    "Predicate failed, filter skipped"
                );
                errors.next(error);
            }
            output.items
        })
    }

    /// Same as [`select_all_by_filters`](Self::select_all_by_filters), keyed by entity id
    pub fn select_all_by_filters_keyed(&self) -> Observable<IndexMap<EntityId, E>> {
        self.select_all_by_filters()
            .map(|items| items.iter().map(|e| (e.id(), e.clone())).collect())
    }

    /// Server-flagged filters with a value, as `id -> value`
    pub fn get_normalized_filters(&self, options: &NormalizeOptions) -> NormalizedFilters {
        normalize(&self.filters.values(), self.sort.get().as_ref(), options)
    }

    /// Call `callback` with the normalized filters after every later filter or sort change
    ///
    /// Replaces any previously installed callback.
    pub fn with_server<F>(&self, callback: F, options: NormalizeOptions)
    where
        F: Fn(&NormalizedFilters) + Send + Sync + 'static,
    {
        if self.is_destroyed() {
            tracing::warn!(registry = %self.name, "with_server called on a destroyed registry");
            return;
        }

        let subscription = combine_latest2(&self.filters.select_all(), &self.sort.as_observable())
            .skip(1)
            .subscribe(move |(filters, sort)| callback(&normalize(filters, sort.as_ref(), &options)));

        if let Some(previous) = lock(&self.server).replace(subscription) {
            previous.unsubscribe();
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Clear the filters and complete every stream
    ///
    /// Later `set_filter` calls fail with [`RegistryError::Destroyed`]. Calling
    /// it again does nothing.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.clear() {
            tracing::warn!(registry = %self.name, error = %e, "Failed to clear filters on destroy");
        }
        if let Some(server) = lock(&self.server).take() {
            server.unsubscribe();
        }

        self.sort.complete();
        self.errors.complete();
        self.filters.close();

        tracing::debug!(registry = %self.name, "Registry destroyed");
        self.events.publish(FiltersEvent::Destroyed {
            registry: self.name.clone(),
        });
    }
}

fn visible_filters<E>(all: &[Filter<E>]) -> Vec<Filter<E>> {
    let mut visible: Vec<Filter<E>> = all.iter().filter(|f| !f.hide).cloned().collect();
    visible.sort_by_key(|f| f.order);
    visible
}

fn normalize<E>(
    filters: &[Filter<E>],
    sort: Option<&SortBy>,
    options: &NormalizeOptions,
) -> NormalizedFilters {
    let mut normalized = NormalizedFilters::new();

    if options.with_sort {
        if let Some(sort) = sort {
            normalized.insert(&options.sort_by_key, Value::String(sort.sort_by.clone()));
            normalized.insert(
                &options.sort_by_order_key,
                Value::String(sort.sort_by_order.as_str().to_string()),
            );
        }
    }

    for filter in filters.iter().filter(|f| f.server) {
        if let Some(value) = &filter.value {
            normalized.insert(filter.id.as_str(), value.clone());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::Order;
    use crate::storage::InMemoryEntityStore;
    use serde_json::json;

    fn registry() -> (Arc<InMemoryEntityStore<Value>>, FiltersRegistry<Value>) {
        let store = Arc::new(
            InMemoryEntityStore::with_entities(
                "fruits",
                vec![
                    json!({"id": 1, "name": "apple"}),
                    json!({"id": 2, "name": "pear"}),
                    json!({"id": 3, "name": "pineapple"}),
                ],
            )
            .unwrap(),
        );
        let registry = FiltersRegistry::new(store.clone() as Arc<dyn EntitySource<Value>>);
        (store, registry)
    }

    fn latest<T: Clone + Send + Sync + 'static>(
        source: &Observable<T>,
    ) -> (Arc<Mutex<Option<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let sub = source.subscribe(move |v| *sink.lock().unwrap() = Some(v.clone()));
        (seen, sub)
    }

    #[test]
    fn test_set_filter_replaces_by_id() {
        let (_store, registry) = registry();
        registry
            .set_filter(FilterParams::new().id("search").value("apple"))
            .unwrap();
        registry
            .set_filter(FilterParams::new().id("search").value("pear"))
            .unwrap();

        assert_eq!(registry.get_all_filters().len(), 1);
        assert_eq!(registry.get_filter_value("search"), Some(json!("pear")));
    }

    #[test]
    fn test_get_filter_value_miss_is_none() {
        let (_store, registry) = registry();
        assert_eq!(registry.get_filter_value("nope"), None);
    }

    #[test]
    fn test_get_filters_hides_and_orders() {
        let (_store, registry) = registry();
        registry
            .set_filter(FilterParams::new().id("b").value("x").order(5))
            .unwrap();
        registry
            .set_filter(FilterParams::new().id("hidden").value("x").hide(true))
            .unwrap();
        registry
            .set_filter(FilterParams::new().id("a").value("x").order(1))
            .unwrap();

        let ids: Vec<String> = registry
            .get_filters()
            .iter()
            .map(|f| f.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_select_all_by_filters_recomputes() {
        let (store, registry) = registry();
        let (seen, _sub) = latest(&registry.select_all_by_filters());
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().len(), 3);

        registry
            .set_filter(FilterParams::new().id("search").value("apple"))
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().len(), 2);

        store.upsert(json!({"id": 4, "name": "Apple juice"})).unwrap();
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().len(), 3);

        registry.remove_filter("search").unwrap();
        assert_eq!(seen.lock().unwrap().as_ref().unwrap().len(), 4);
    }

    #[test]
    fn test_keyed_output() {
        let (_store, registry) = registry();
        registry.set_sort_by(SortBy::desc("id"));
        let (seen, _sub) = latest(&registry.select_all_by_filters_keyed());

        let keys: Vec<EntityId> = seen.lock().unwrap().as_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![EntityId::from(3), EntityId::from(2), EntityId::from(1)]);
    }

    #[test]
    fn test_predicate_errors_are_published() {
        let (_store, registry) = registry();
        let (error, _errors) = latest(&registry.select_errors());
        let (seen, _sub) = latest(&registry.select_all_by_filters());

        registry
            .set_filter(FilterParams::new().id("broken").predicate(
                crate::filters::filter::Predicate::try_new(|_, _, _, _| {
                    anyhow::bail!("boom")
                }),
            ))
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_ref().unwrap().len(), 3);
        let error = error.lock().unwrap().clone().unwrap();
        assert_eq!(error.filter_id, "broken");
        assert_eq!(error.message, "boom");
    }

    #[test]
    fn test_normalized_filters_server_only() {
        let (_store, registry) = registry();
        registry
            .set_filter(FilterParams::new().id("search").value("apple"))
            .unwrap();
        registry
            .set_filter(FilterParams::new().id("status").value("open").server(true))
            .unwrap();
        registry.set_sort_by(SortBy::new("name", Order::Desc));

        let plain = registry.get_normalized_filters(&NormalizeOptions::default());
        assert_eq!(plain.len(), 1);
        assert_eq!(plain.get("status"), Some(&json!("open")));

        let with_sort = registry.get_normalized_filters(&NormalizeOptions::default().with_sort());
        assert_eq!(
            with_sort.to_query_string(),
            "sortBy=name&sortByOrder=desc&status=open"
        );
    }

    #[test]
    fn test_with_server_skips_initial_state() {
        let (_store, registry) = registry();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        registry.with_server(
            move |normalized| sink.lock().unwrap().push(normalized.len()),
            NormalizeOptions::default(),
        );
        assert!(calls.lock().unwrap().is_empty());

        registry
            .set_filter(FilterParams::new().id("status").value("open").server(true))
            .unwrap();
        registry.set_sort_by(SortBy::asc("name"));

        assert_eq!(*calls.lock().unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_destroy_is_terminal_and_idempotent() {
        let (_store, registry) = registry();
        let mut events = registry.events().subscribe();
        registry
            .set_filter(FilterParams::new().id("search").value("apple"))
            .unwrap();

        registry.destroy();
        registry.destroy();

        assert!(registry.is_destroyed());
        assert!(registry.get_all_filters().is_empty());
        let err = registry
            .set_filter(FilterParams::new().id("search").value("x"))
            .unwrap_err();
        assert_eq!(err.error_code(), "REGISTRY_DESTROYED");
        assert!(registry.remove_filter("search").is_ok());

        let actions: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.event.action().to_string())
            .collect();
        assert_eq!(actions, vec!["filter_set", "filters_cleared", "destroyed"]);
    }

    #[test]
    fn test_unsubscribing_releases_listeners() {
        let (_store, registry) = registry();
        let sub = registry.select_all_by_filters().subscribe(|_| {});
        assert_eq!(registry.active_subscriptions(), 1);
        sub.unsubscribe();
        assert_eq!(registry.active_subscriptions(), 0);
    }
}
