//! Paginated view adapter
//!
//! [`PaginatedDataSource`] feeds a table-like display widget. It listens to a
//! registry's filtered view, keeps the filtered count, and slices out the
//! page selected by an optional [`Paginator`].
//!
//! ```text
//! registry.select_all_by_filters() ──▶ update_count ──(deferred)──▶ paginator length / clamp
//!                │                                                        │
//!                ▼                                                        ▼
//!            filtered ──────── combine_latest2 ◀── page events | internal page changes | initialized
//!                                     │
//!                                     ▼
//!                               page slice ──▶ render data ──▶ connect()
//! ```

use crate::config::FiltersConfig;
use crate::core::entity::Entity;
use crate::core::error::{DataSourceError, FiltersError};
use crate::core::query::{SortBy, last_page_index};
use crate::core::store::EntitySource;
use crate::datasource::paginator::Paginator;
use crate::datasource::sort::{SortDirection, SortControl};
use crate::filters::filter::{FilterId, FilterParams};
use crate::filters::registry::FiltersRegistry;
use crate::reactive::{
    BehaviorSubject, Observable, Subject, Subscription, SubscriptionBag, combine_latest2, lock,
};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

/// Lifecycle of a data source
///
/// `Idle → Connected → Disconnected`; the last state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceState {
    Idle,
    Connected,
    Disconnected,
}

struct DataSourceInner<E: Entity> {
    registry: Arc<FiltersRegistry<E>>,
    /// Whether `disconnect` should tear the registry down
    owns_registry: bool,
    search_filter_id: String,
    state: Mutex<DataSourceState>,
    paginator: Mutex<Option<Paginator>>,
    sort: Mutex<Option<SortControl>>,
    count: BehaviorSubject<usize>,
    /// Latest filtered sequence; `None` until the registry first emits
    filtered: BehaviorSubject<Option<Vec<E>>>,
    render_data: BehaviorSubject<Vec<E>>,
    internal_page_changes: Subject<()>,
    upstream: Mutex<Option<Subscription>>,
    render: Mutex<Option<Subscription>>,
    /// Subscriptions to the attached sort control
    sort_widget: SubscriptionBag,
}

/// Paginated, filterable view of an entity source
///
/// Clones share the same underlying state.
pub struct PaginatedDataSource<E: Entity> {
    inner: Arc<DataSourceInner<E>>,
}

impl<E: Entity> Clone for PaginatedDataSource<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Entity> fmt::Debug for PaginatedDataSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedDataSource")
            .field("registry", &self.inner.registry.name())
            .field("owns_registry", &self.inner.owns_registry)
            .field("state", &self.state())
            .field("count", &self.get_count())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> PaginatedDataSource<E> {
    /// Data source with its own registry over `source`
    pub fn new(source: Arc<dyn EntitySource<E>>) -> Self {
        Self::with_config(source, &FiltersConfig::default())
    }

    /// Data source with its own registry, configured by `config`
    pub fn with_config(source: Arc<dyn EntitySource<E>>, config: &FiltersConfig) -> Self {
        let registry = Arc::new(FiltersRegistry::with_config(source, config));
        Self::build(registry, true, config.search_filter_id.clone())
    }

    /// Data source over a registry owned by the caller
    ///
    /// `disconnect` leaves a shared registry and its filters untouched.
    pub fn with_registry(registry: Arc<FiltersRegistry<E>>) -> Self {
        let search_filter_id = FiltersConfig::default().search_filter_id;
        Self::build(registry, false, search_filter_id)
    }

    fn build(registry: Arc<FiltersRegistry<E>>, owns_registry: bool, search_filter_id: String) -> Self {
        Self {
            inner: Arc::new(DataSourceInner {
                registry,
                owns_registry,
                search_filter_id,
                state: Mutex::new(DataSourceState::Idle),
                paginator: Mutex::new(None),
                sort: Mutex::new(None),
                count: BehaviorSubject::new(0),
                filtered: BehaviorSubject::new(None),
                render_data: BehaviorSubject::new(Vec::new()),
                internal_page_changes: Subject::new(),
                upstream: Mutex::new(None),
                render: Mutex::new(None),
                sort_widget: SubscriptionBag::new(),
            }),
        }
    }

    pub fn state(&self) -> DataSourceState {
        *lock(&self.inner.state)
    }

    pub fn registry(&self) -> &Arc<FiltersRegistry<E>> {
        &self.inner.registry
    }

    pub fn owns_registry(&self) -> bool {
        self.inner.owns_registry
    }

    pub fn paginator(&self) -> Option<Paginator> {
        self.inner.paginator()
    }

    pub fn sort_control(&self) -> Option<SortControl> {
        lock(&self.inner.sort).clone()
    }

    /// Rows currently rendered
    pub fn data(&self) -> Vec<E> {
        self.inner.render_data.get()
    }

    /// Start streaming rows to the display widget
    ///
    /// The first call subscribes to the registry; later calls return the same
    /// stream. Fails once the data source has been disconnected.
    pub fn connect(&self) -> Result<Observable<Vec<E>>, FiltersError> {
        {
            let mut state = lock(&self.inner.state);
            match *state {
                DataSourceState::Disconnected => return Err(DataSourceError::Disconnected.into()),
                DataSourceState::Connected => return Ok(self.inner.render_data.as_observable()),
                DataSourceState::Idle => *state = DataSourceState::Connected,
            }
        }

        let weak = Arc::downgrade(&self.inner);
        let scheduler = self.inner.registry.scheduler().clone();
        let upstream = self
            .inner
            .registry
            .select_all_by_filters()
            .subscribe(move |items: &Vec<E>| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                scheduler.run(|| {
                    inner.update_count(items.len());
                    inner.filtered.next(Some(items.clone()));
                });
            });
        if let Some(previous) = lock(&self.inner.upstream).replace(upstream) {
            previous.unsubscribe();
        }

        self.inner.update_change_subscription();
        tracing::debug!(registry = %self.inner.registry.name(), "Data source connected");
        Ok(self.inner.render_data.as_observable())
    }

    /// Stop streaming and release every subscription
    ///
    /// An owned registry is cleared and destroyed. Idempotent.
    pub fn disconnect(&self) {
        {
            let mut state = lock(&self.inner.state);
            if *state == DataSourceState::Disconnected {
                return;
            }
            *state = DataSourceState::Disconnected;
        }

        self.inner.release();

        if self.inner.owns_registry {
            if let Err(e) = self.inner.registry.clear_filters() {
                tracing::warn!(registry = %self.inner.registry.name(), error = %e, "Failed to clear filters on disconnect");
            }
            self.inner.registry.destroy();
        }

        self.inner.render_data.complete();
        self.inner.filtered.complete();
        self.inner.count.complete();
        self.inner.internal_page_changes.complete();

        tracing::debug!(
            registry = %self.inner.registry.name(),
            owned = self.inner.owns_registry,
            "Data source disconnected"
        );
    }

    /// Filter every row by a search term; an empty term removes the search filter
    pub fn set_search(&self, text: &str) -> Result<(), FiltersError> {
        let id = self.inner.search_filter_id.as_str();
        if text.is_empty() {
            self.inner.registry.remove_filter(id)
        } else {
            self.inner
                .registry
                .set_filter(FilterParams::new().id(id).value(text))
                .map(|_| ())
        }
    }

    /// Current search term, if any
    pub fn search(&self) -> Option<String> {
        self.get_filter_value(self.inner.search_filter_id.as_str())
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Attach a sort widget
    ///
    /// Its changes drive the registry's sort spec; once initialized, its
    /// current column and direction become the default sort. A previously
    /// attached widget is detached.
    pub fn set_sort(&self, control: SortControl) {
        self.inner.sort_widget.unsubscribe_all();

        let registry = self.inner.registry.clone();
        let on_change = control.sort_change().subscribe(move |change| {
            registry.set_sort_by(change.to_sort_by());
        });

        let registry = self.inner.registry.clone();
        let widget = control.clone();
        let on_init = control.initialized().subscribe(move |_| {
            registry.set_sort_by(SortBy::new(widget.active(), widget.direction().to_order()));
        });

        self.inner.sort_widget.add(on_change);
        self.inner.sort_widget.add(on_init);
        *lock(&self.inner.sort) = Some(control);
    }

    /// Attach a pager; rendered rows are sliced to its current page
    pub fn set_paginator(&self, paginator: Paginator) {
        paginator.set_length(self.get_count());
        *lock(&self.inner.paginator) = Some(paginator);
        if self.state() == DataSourceState::Connected {
            self.inner.update_change_subscription();
        }
    }

    /// Set the registry's sort spec
    pub fn set_default_sort(&self, column: impl Into<String>, direction: SortDirection) {
        self.inner
            .registry
            .set_sort_by(SortBy::new(column, direction.to_order()));
    }

    pub fn add_filter(&self, params: FilterParams<E>) -> Result<FilterId, FiltersError> {
        self.set_filter(params)
    }

    pub fn set_filter(&self, params: FilterParams<E>) -> Result<FilterId, FiltersError> {
        self.inner.registry.set_filter(params)
    }

    pub fn remove_filter(&self, id: impl Into<FilterId>) -> Result<(), FiltersError> {
        self.inner.registry.remove_filter(id)
    }

    pub fn clear_filters(&self) -> Result<(), FiltersError> {
        self.inner.registry.clear_filters()
    }

    pub fn get_filter_value(&self, id: impl Into<FilterId>) -> Option<Value> {
        self.inner.registry.get_filter_value(id)
    }

    /// Number of filtered rows, across all pages
    pub fn select_count(&self) -> Observable<usize> {
        self.inner.count.as_observable()
    }

    pub fn get_count(&self) -> usize {
        self.inner.count.get()
    }
}

impl<E: Entity> DataSourceInner<E> {
    fn paginator(&self) -> Option<Paginator> {
        lock(&self.paginator).clone()
    }

    fn is_connected(&self) -> bool {
        *lock(&self.state) == DataSourceState::Connected
    }

    fn update_count(self: &Arc<Self>, count: usize) {
        if count == self.count.get() {
            return;
        }
        self.count.next(count);

        if self.paginator().is_some() {
            let weak: Weak<Self> = Arc::downgrade(self);
            self.registry.scheduler().defer(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.update_paginator(count);
                }
            });
        }
    }

    /// Sync the pager with the filtered length and pull its page index back in range
    fn update_paginator(&self, length: usize) {
        if !self.is_connected() {
            return;
        }
        let Some(paginator) = self.paginator() else {
            return;
        };

        paginator.set_length(length);

        let page_index = paginator.page_index();
        if page_index > 0 {
            let last = last_page_index(length, paginator.page_size());
            let clamped = page_index.min(last);
            if clamped != page_index {
                paginator.set_page_index(clamped);
                tracing::debug!(
                    registry = %self.registry.name(),
                    from = page_index,
                    to = clamped,
                    "Page index clamped"
                );
                self.internal_page_changes.next(());
            }
        }
    }

    fn page_data(&self, data: &[E]) -> Vec<E> {
        let Some(paginator) = self.paginator() else {
            return data.to_vec();
        };

        let size = paginator.page_size();
        let start = (paginator.page_index() * size).min(data.len());
        let end = (start + size).min(data.len());
        data[start..end].to_vec()
    }

    /// (Re)build the subscription producing render data
    fn update_change_subscription(self: &Arc<Self>) {
        let page_change: Observable<()> = match self.paginator() {
            Some(paginator) => Observable::merge(vec![
                paginator.page().map(|_| ()),
                self.internal_page_changes.as_observable(),
                paginator.initialized(),
            ]),
            None => Observable::of(()),
        };
        let filtered = self.filtered.as_observable().filter_map(|items| items.clone());

        let weak = Arc::downgrade(self);
        let render = combine_latest2(&filtered, &page_change).subscribe(move |(items, _)| {
            if let Some(inner) = weak.upgrade() {
                let page = inner.page_data(items);
                inner.render_data.next(page);
            }
        });

        if let Some(previous) = lock(&self.render).replace(render) {
            previous.unsubscribe();
        }
        self.internal_page_changes.next(());
    }

    fn release(&self) {
        for slot in [&self.upstream, &self.render] {
            if let Some(subscription) = lock(slot).take() {
                subscription.unsubscribe();
            }
        }
        self.sort_widget.unsubscribe_all();
    }
}

impl<E: Entity> Drop for DataSourceInner<E> {
    fn drop(&mut self) {
        self.release();
    }
}
