//! Filter-and-sort pipeline
//!
//! Pure functions turning a base collection, a set of filters and an optional
//! sort into the visible sequence. The registry wires them to its streams.
//!
//! ```text
//! BaseCollection ──▶ to_vec ──▶ apply_filters (local, by order) ──▶ apply_sort ──▶ items
//!                                      │
//!                                      └──▶ PredicateError (filter skipped)
//! ```

use crate::core::entity::Entity;
use crate::core::error::PredicateError;
use crate::core::field::FieldValue;
use crate::core::query::{Order, SortBy};
use crate::core::store::BaseCollection;
use crate::filters::filter::Filter;

/// Result of one pipeline pass
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput<E> {
    pub items: Vec<E>,
    /// Predicates that failed during the pass; their filters were skipped
    pub errors: Vec<PredicateError>,
}

/// Filters evaluated in-process, in ascending `order` (stable for ties)
pub fn local_filters<E>(filters: &[Filter<E>]) -> Vec<&Filter<E>> {
    let mut local: Vec<&Filter<E>> = filters.iter().filter(|f| !f.server).collect();
    local.sort_by_key(|f| f.order);
    local
}

/// Keep the entities accepted by every local filter
///
/// Each filter sees the survivors of the previous one. A predicate that
/// returns an error disqualifies its filter for the pass: the candidates it
/// had partially processed are kept as they were.
pub fn apply_filters<E: Entity>(data: Vec<E>, filters: &[Filter<E>]) -> PipelineOutput<E> {
    let mut candidates = data;
    let mut errors = Vec::new();

    for filter in local_filters(filters) {
        match run_filter(&candidates, filter) {
            Ok(kept) => candidates = kept,
            Err(error) => errors.push(error),
        }
    }

    PipelineOutput {
        items: candidates,
        errors,
    }
}

fn run_filter<E: Entity>(candidates: &[E], filter: &Filter<E>) -> Result<Vec<E>, PredicateError> {
    let mut kept = Vec::with_capacity(candidates.len());
    for (index, entity) in candidates.iter().enumerate() {
        let accepted = filter
            .predicate
            .evaluate(entity, index, candidates, filter)
            .map_err(|e| PredicateError {
                filter_id: filter.id.to_string(),
                index,
                message: e.to_string(),
            })?;
        if accepted {
            kept.push(entity.clone());
        }
    }
    Ok(kept)
}

/// Stable sort on one field
///
/// Strings compare case-insensitively. An entity missing the field sorts as
/// null: first when ascending, last when descending. Entities missing it keep
/// their relative position.
pub fn apply_sort<E: Entity>(mut data: Vec<E>, sort: Option<&SortBy>) -> Vec<E> {
    let Some(sort) = sort else {
        return data;
    };

    let key = |entity: &E| {
        entity
            .field_value(&sort.sort_by)
            .unwrap_or(FieldValue::Null)
    };
    data.sort_by(|a, b| {
        let ordering = key(a).compare(&key(b));
        match sort.sort_by_order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    });
    data
}

/// Full pass: normalize, filter, then sort
pub fn run_pipeline<E: Entity>(
    base: &BaseCollection<E>,
    filters: &[Filter<E>],
    sort: Option<&SortBy>,
) -> PipelineOutput<E> {
    let filtered = apply_filters(base.to_vec(), filters);
    PipelineOutput {
        items: apply_sort(filtered.items, sort),
        errors: filtered.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::filter::{FilterParams, Predicate, create_filter};
    use serde_json::{Value, json};

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": 3, "name": "cherry", "price": 3}),
            json!({"id": 1, "name": "Apple", "price": 1}),
            json!({"id": 2, "name": "banana", "price": 2}),
        ]
    }

    fn ids(items: &[Value]) -> Vec<i64> {
        items.iter().filter_map(|v| v["id"].as_i64()).collect()
    }

    #[test]
    fn test_filters_run_by_order() {
        let trace = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let make = |id: &str, order: i32| {
            let trace = trace.clone();
            let tag = id.to_string();
            create_filter::<Value>(FilterParams::new().id(id).order(order).predicate(
                Predicate::new(move |_, index, _, _| {
                    if index == 0 {
                        trace.lock().unwrap().push(tag.clone());
                    }
                    true
                }),
            ))
            .unwrap()
        };

        let filters = vec![make("late", 20), make("early", 1), make("mid", 10)];
        apply_filters(rows(), &filters);

        assert_eq!(*trace.lock().unwrap(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_each_filter_sees_survivors() {
        let cheap = create_filter::<Value>(
            FilterParams::new()
                .id("cheap")
                .order(1)
                .predicate_fn(|v: &Value| v["price"].as_i64().unwrap_or(0) < 3),
        )
        .unwrap();
        let seen_len = std::sync::Arc::new(std::sync::Mutex::new(0));
        let sink = seen_len.clone();
        let spy = create_filter::<Value>(FilterParams::new().id("spy").order(2).predicate(
            Predicate::new(move |_, _, candidates: &[Value], _| {
                *sink.lock().unwrap() = candidates.len();
                true
            }),
        ))
        .unwrap();

        let output = apply_filters(rows(), &[spy, cheap]);

        assert_eq!(ids(&output.items), vec![1, 2]);
        assert_eq!(*seen_len.lock().unwrap(), 2);
    }

    #[test]
    fn test_server_filters_are_skipped() {
        let reject_all = create_filter::<Value>(
            FilterParams::new()
                .id("remote")
                .server(true)
                .predicate_fn(|_| false),
        )
        .unwrap();

        let output = apply_filters(rows(), &[reject_all]);
        assert_eq!(output.items.len(), 3);
    }

    #[test]
    fn test_failing_predicate_skips_only_its_filter() {
        let broken = create_filter::<Value>(FilterParams::new().id("broken").predicate(
            Predicate::try_new(|v: &Value, _, _, _| {
                if v["id"] == 1 {
                    anyhow::bail!("no price for {}", v["id"]);
                }
                Ok(false)
            }),
        ))
        .unwrap();
        let cheap = create_filter::<Value>(
            FilterParams::new()
                .id("cheap")
                .predicate_fn(|v: &Value| v["price"].as_i64().unwrap_or(0) < 3),
        )
        .unwrap();

        let output = apply_filters(rows(), &[broken, cheap]);

        assert_eq!(ids(&output.items), vec![1, 2]);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].filter_id, "broken");
        assert_eq!(output.errors[0].index, 1);
        assert!(output.errors[0].message.contains("no price"));
    }

    #[test]
    fn test_sort_is_case_insensitive_and_reversible() {
        let sorted = apply_sort(rows(), Some(&SortBy::asc("name")));
        assert_eq!(ids(&sorted), vec![1, 2, 3]);

        let sorted = apply_sort(rows(), Some(&SortBy::desc("name")));
        assert_eq!(ids(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_keeps_entities_missing_the_field_in_place() {
        let data = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let sorted = apply_sort(data, Some(&SortBy::asc("missing")));
        assert_eq!(ids(&sorted), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_with_some_rows_missing_the_field() {
        let data: Vec<Value> = (0..200)
            .map(|i| {
                if i % 3 == 0 {
                    json!({"id": i})
                } else {
                    json!({"id": i, "price": 1000 - i})
                }
            })
            .collect();

        let prices = |rows: &[Value]| -> Vec<i64> {
            rows.iter().filter_map(|v| v["price"].as_i64()).collect()
        };

        let sorted = apply_sort(data.clone(), Some(&SortBy::asc("price")));
        let mut expected = prices(&sorted);
        expected.sort();
        assert_eq!(prices(&sorted), expected);
        // Missing prices come first, in their original order
        assert!(sorted[..67].iter().all(|v| v.get("price").is_none()));
        assert_eq!(ids(&sorted[..3]), vec![0, 3, 6]);

        let sorted = apply_sort(data, Some(&SortBy::desc("price")));
        let mut expected = prices(&sorted);
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(prices(&sorted), expected);
        assert!(sorted[133..].iter().all(|v| v.get("price").is_none()));
    }

    #[test]
    fn test_no_sort_keeps_order() {
        assert_eq!(ids(&apply_sort(rows(), None)), vec![3, 1, 2]);
    }

    #[test]
    fn test_pipeline_on_keyed_collection() {
        let base = BaseCollection::Keyed(rows().into_iter().map(|r| (r.id(), r)).collect());
        let search = create_filter::<Value>(FilterParams::new().id("q").value("an")).unwrap();

        let output = run_pipeline(&base, &[search], Some(&SortBy::asc("price")));

        assert_eq!(ids(&output.items), vec![2]);
        assert!(output.errors.is_empty());
    }
}
