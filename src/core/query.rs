//! Sort, pagination and normalized-query types

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    /// `"desc"` (any case) is descending, anything else ascending
    pub fn from_direction(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("desc") {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single active sort specification of a registry
///
/// # Format
/// - `field:asc` or `field` (ascending)
/// - `field:desc` (descending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortBy {
    /// Field name to sort on
    pub sort_by: String,

    /// Direction, ascending by default
    #[serde(default)]
    pub sort_by_order: Order,
}

impl SortBy {
    pub fn new(sort_by: impl Into<String>, sort_by_order: Order) -> Self {
        Self {
            sort_by: sort_by.into(),
            sort_by_order,
        }
    }

    pub fn asc(sort_by: impl Into<String>) -> Self {
        Self::new(sort_by, Order::Asc)
    }

    pub fn desc(sort_by: impl Into<String>) -> Self {
        Self::new(sort_by, Order::Desc)
    }

    /// Parse a `field[:asc|:desc]` expression; `None` for an empty field
    pub fn parse(expr: &str) -> Option<Self> {
        let (field, direction) = match expr.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim()),
            None => (expr.trim(), "asc"),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self::new(field, Order::from_direction(direction)))
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sort_by, self.sort_by_order)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        // Ensure limit is at least 1 to avoid division by zero
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1) * limit;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start + limit < total,
            has_prev: page > 1,
        }
    }

    /// Same as [`PaginationMeta::new`] from a 0-based page index
    pub fn from_page_index(page_index: usize, page_size: usize, total: usize) -> Self {
        Self::new(page_index + 1, page_size, total)
    }
}

/// Last valid 0-based page index for `length` items
pub fn last_page_index(length: usize, page_size: usize) -> usize {
    length.div_ceil(page_size.max(1)).saturating_sub(1)
}

/// Options controlling [`NormalizedFilters`] generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Prepend the sort spec to the normalized filters
    pub with_sort: bool,

    /// Key used for the sort field
    pub sort_by_key: String,

    /// Key used for the sort direction
    pub sort_by_order_key: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            with_sort: false,
            sort_by_key: "sortBy".to_string(),
            sort_by_order_key: "sortByOrder".to_string(),
        }
    }
}

impl NormalizeOptions {
    pub fn with_sort(mut self) -> Self {
        self.with_sort = true;
        self
    }
}

/// Server-side view of the filter state: `key -> value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedFilters(IndexMap<String, Value>);

impl NormalizedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }

    /// Render as `key=value&key2=value2`, URL-encoded
    ///
    /// String values are written raw, everything else as JSON text.
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(&value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
