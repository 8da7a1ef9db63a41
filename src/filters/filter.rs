//! Filter records and the filter factory

use crate::core::entity::Entity;
use crate::core::error::FilterError;
use crate::filters::predicate::{SearchOptions, default_predicate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Default ordering weight of a filter
pub const DEFAULT_ORDER: i32 = 10;

/// Identity of a filter within a registry
///
/// Numeric ids are stored as their decimal text, so `FilterId::from(3)` and
/// `FilterId::from("3")` name the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    /// A fresh random id
    pub fn generate() -> Self {
        FilterId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterId {
    fn from(value: &str) -> Self {
        FilterId(value.to_string())
    }
}

impl From<String> for FilterId {
    fn from(value: String) -> Self {
        FilterId(value)
    }
}

impl From<&String> for FilterId {
    fn from(value: &String) -> Self {
        FilterId(value.clone())
    }
}

impl From<&FilterId> for FilterId {
    fn from(value: &FilterId) -> Self {
        value.clone()
    }
}

impl From<i64> for FilterId {
    fn from(value: i64) -> Self {
        FilterId(value.to_string())
    }
}

impl From<i32> for FilterId {
    fn from(value: i32) -> Self {
        FilterId(value.to_string())
    }
}

impl From<u32> for FilterId {
    fn from(value: u32) -> Self {
        FilterId(value.to_string())
    }
}

impl From<Uuid> for FilterId {
    fn from(value: Uuid) -> Self {
        FilterId(value.to_string())
    }
}

type PredicateFn<E> = dyn Fn(&E, usize, &[E], &Filter<E>) -> anyhow::Result<bool> + Send + Sync;

/// Decides whether one entity passes a filter
///
/// Called with the entity, its index in the current candidate sequence, the
/// candidate sequence itself and the filter being applied.
pub struct Predicate<E> {
    f: Arc<PredicateFn<E>>,
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl<E: 'static> Predicate<E> {
    /// Wrap an infallible predicate
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E, usize, &[E], &Filter<E>) -> bool + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move |entity, index, candidates, filter| {
                Ok(f(entity, index, candidates, filter))
            }),
        }
    }

    /// Wrap a predicate that may fail
    ///
    /// An error skips the whole filter for the current evaluation pass.
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&E, usize, &[E], &Filter<E>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Predicate that only looks at the entity
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self::new(move |entity, _, _, _| f(entity))
    }

    pub fn evaluate(
        &self,
        entity: &E,
        index: usize,
        candidates: &[E],
        filter: &Filter<E>,
    ) -> anyhow::Result<bool> {
        (self.f)(entity, index, candidates, filter)
    }
}

/// One filtering rule
pub struct Filter<E> {
    /// Unique key within the registry
    pub id: FilterId,

    /// Display name; `"{Id}: {value}"` by default
    pub name: Option<String>,

    /// Evaluation and display weight, lower first
    pub order: i32,

    /// Payload read by the predicate, also used to build the default name
    pub value: Option<Value>,

    /// Excluded from visible filter listings
    pub hide: bool,

    /// Meant for a remote query; never evaluated locally
    pub server: bool,

    pub predicate: Predicate<E>,

    /// Caller-defined extra fields, kept verbatim
    pub metadata: HashMap<String, Value>,
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            order: self.order,
            value: self.value.clone(),
            hide: self.hide,
            server: self.server,
            predicate: self.predicate.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("order", &self.order)
            .field("value", &self.value)
            .field("hide", &self.hide)
            .field("server", &self.server)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<E> Filter<E> {
    /// Name to show in a filter list: the explicit name, else the id
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Partial filter accepted by [`create_filter`]; every field is optional
pub struct FilterParams<E> {
    pub id: Option<FilterId>,
    pub name: Option<String>,
    pub order: Option<i32>,
    pub value: Option<Value>,
    pub hide: Option<bool>,
    pub server: Option<bool>,
    pub predicate: Option<Predicate<E>>,
    pub metadata: HashMap<String, Value>,
}

impl<E> Default for FilterParams<E> {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            order: None,
            value: None,
            hide: None,
            server: None,
            predicate: None,
            metadata: HashMap::new(),
        }
    }
}

impl<E> fmt::Debug for FilterParams<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterParams")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("order", &self.order)
            .field("value", &self.value)
            .field("hide", &self.hide)
            .field("server", &self.server)
            .field("predicate", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: 'static> FilterParams<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<FilterId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn hide(mut self, hide: bool) -> Self {
        self.hide = Some(hide);
        self
    }

    pub fn server(mut self, server: bool) -> Self {
        self.server = Some(server);
        self
    }

    pub fn predicate(mut self, predicate: Predicate<E>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Shorthand for an entity-only predicate
    pub fn predicate_fn<F>(self, f: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate(Predicate::from_fn(f))
    }

    /// Attach a caller-defined field
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl<E> From<&Filter<E>> for FilterParams<E> {
    fn from(filter: &Filter<E>) -> Self {
        Self {
            id: Some(filter.id.clone()),
            name: filter.name.clone(),
            order: Some(filter.order),
            value: filter.value.clone(),
            hide: Some(filter.hide),
            server: Some(filter.server),
            predicate: Some(filter.predicate.clone()),
            metadata: filter.metadata.clone(),
        }
    }
}

/// Defaults applied by [`create_filter_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDefaults {
    pub order: i32,
    pub search: SearchOptions,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            search: SearchOptions::default(),
        }
    }
}

/// Build a filter with the stock defaults
pub fn create_filter<E: Entity>(params: FilterParams<E>) -> Result<Filter<E>, FilterError> {
    create_filter_with(params, &FilterDefaults::default())
}

/// Build a filter, filling in whatever the caller left out
///
/// - no id: a fresh UUID
/// - no name, but id and value given: `"{Capitalize(id)}: {value}"`
/// - no predicate, but a value: the default search predicate
/// - no predicate and no value: [`FilterError::MissingPredicate`]
pub fn create_filter_with<E: Entity>(
    params: FilterParams<E>,
    defaults: &FilterDefaults,
) -> Result<Filter<E>, FilterError> {
    let has_value = params.value.as_ref().is_some_and(is_present);

    let name = params.name.or_else(|| match (&params.id, &params.value) {
        (Some(id), Some(value)) if has_value => {
            Some(format!("{}: {}", capitalize(id.as_str()), value_text(value)))
        }
        _ => None,
    });
    let id = params.id.unwrap_or_else(FilterId::generate);

    let predicate = match params.predicate {
        Some(predicate) => predicate,
        None if has_value => default_predicate(defaults.search.clone()),
        None => return Err(FilterError::MissingPredicate { id: id.to_string() }),
    };

    Ok(Filter {
        id,
        name,
        order: params.order.unwrap_or(defaults.order),
        value: params.value,
        hide: params.hide.unwrap_or(false),
        server: params.server.unwrap_or(false),
        predicate,
        metadata: params.metadata,
    })
}

/// A value counts as present unless it is `null` or an empty string
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Text form of a filter value: strings raw, everything else as JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
