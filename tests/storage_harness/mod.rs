//! Shared test harness for entity store and pipeline testing
//!
//! Provides `TestEntity` implementing `Entity` with fields covering the
//! scalar `FieldValue` variants, plus fixtures used across the suites.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod entity_store_tests;

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use this_filters::core::entity::{Entity, EntityId};
use this_filters::core::field::FieldValue;
use this_filters::reactive::{Observable, Subscription};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TestEntity — covers the scalar FieldValue variants
// ---------------------------------------------------------------------------

/// A test entity with fields spanning the scalar `FieldValue` variants.
///
/// Fields:
/// - `id`: i64 (Integer variant, identity)
/// - `name`: String
/// - `email`: String
/// - `score`: f64 (Float variant)
/// - `active`: bool (Boolean variant)
/// - `owner`: Uuid (Uuid variant)
#[derive(Clone, Debug, PartialEq)]
pub struct TestEntity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub score: f64,
    pub active: bool,
    pub owner: Uuid,
}

impl Entity for TestEntity {
    fn id(&self) -> EntityId {
        EntityId::Int(self.id)
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Integer(self.id)),
            "name" => Some(FieldValue::String(self.name.clone())),
            "email" => Some(FieldValue::String(self.email.clone())),
            "score" => Some(FieldValue::Float(self.score)),
            "active" => Some(FieldValue::Boolean(self.active)),
            "owner" => Some(FieldValue::Uuid(self.owner)),
            _ => None,
        }
    }

    fn field_names(&self) -> Vec<String> {
        ["id", "name", "email", "score", "active", "owner"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Build a `TestEntity` with a random owner
pub fn create_test_entity(id: i64, name: &str, email: &str, score: f64, active: bool) -> TestEntity {
    TestEntity {
        id,
        name: name.to_string(),
        email: email.to_string(),
        score,
        active,
        owner: Uuid::new_v4(),
    }
}

/// Three fruits; "apple" matches ids 1 and 3
pub fn fruits() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Apple"}),
        json!({"id": 2, "name": "Pear"}),
        json!({"id": 3, "name": "Pineapple"}),
    ]
}

/// `n` rows named `item 1` .. `item n`
pub fn items(n: i64) -> Vec<Value> {
    (1..=n)
        .map(|id| json!({"id": id, "name": format!("item {id}")}))
        .collect()
}

pub fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().filter_map(|r| r["id"].as_i64()).collect()
}

/// Record every emission of `source`
pub fn record<T: Clone + Send + Sync + 'static>(
    source: &Observable<T>,
) -> (Arc<Mutex<Vec<T>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = source.subscribe(move |value: &T| sink.lock().unwrap().push(value.clone()));
    (seen, subscription)
}

/// Last value recorded, panicking when nothing was emitted
pub fn last<T: Clone>(seen: &Arc<Mutex<Vec<T>>>) -> T {
    seen.lock()
        .unwrap()
        .last()
        .cloned()
        .expect("no emission recorded")
}
