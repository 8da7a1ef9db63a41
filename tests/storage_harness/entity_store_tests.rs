//! Macro-generated test suite for `EntityStore<TestEntity>` contract validation.
//!
//! The `entity_store_tests!` macro generates a test module that validates any
//! `EntityStore<TestEntity>` implementation against the full contract: add,
//! update, remove, point lookups and the reactive selects.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use this_filters::storage::InMemoryEntityStore;
//!
//! entity_store_tests!(list, InMemoryEntityStore::<TestEntity>::new("test"));
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_add_and_get` — add then retrieve, verify all fields
//! - `test_get_nonexistent` — unknown id returns None
//! - `test_add_duplicate_id` — second add with the same id fails
//! - `test_update_existing` — mutate name, verify persisted
//! - `test_update_nonexistent` — update unknown id returns Err
//! - `test_remove_existing` / `test_remove_nonexistent`
//!
//! ## Reactive
//! - `test_select_all_replays_and_tracks` — current value first, then each change
//! - `test_select_by_id_tracks_one_entity`
//! - `test_select_all_keeps_insertion_order`

/// Generate a full `EntityStore<TestEntity>` conformance test suite.
///
/// `$factory` must be an expression that evaluates to an empty store. It is
/// re-evaluated for each test to ensure isolation.
#[macro_export]
macro_rules! entity_store_tests {
    ($suite:ident, $factory:expr) => {
        mod $suite {
            use super::*;
            use this_filters::core::entity::{Entity, EntityId};
            use this_filters::core::store::{BaseCollection, EntitySource, EntityStore};

            // ==================================================================
            // CRUD
            // ==================================================================

            #[test]
            fn test_add_and_get() {
                let store = $factory;
                let entity = create_test_entity(1, "Alice", "alice@test.com", 4.5, true);

                store.add(entity.clone()).unwrap();

                let retrieved = store.get_by_id(&EntityId::from(1)).unwrap();
                assert_eq!(retrieved, entity);
                assert_eq!(store.get_all().len(), 1);
            }

            #[test]
            fn test_get_nonexistent() {
                let store = $factory;
                assert!(store.get_by_id(&EntityId::from(42)).is_none());
            }

            #[test]
            fn test_add_duplicate_id() {
                let store = $factory;
                store
                    .add(create_test_entity(1, "Alice", "a@test.com", 1.0, true))
                    .unwrap();

                let err = store
                    .add(create_test_entity(1, "Bob", "b@test.com", 2.0, false))
                    .unwrap_err();

                assert_eq!(err.error_code(), "ENTITY_ALREADY_EXISTS");
                assert_eq!(store.get_by_id(&EntityId::from(1)).unwrap().name, "Alice");
            }

            #[test]
            fn test_update_existing() {
                let store = $factory;
                let mut entity = create_test_entity(7, "Carol", "c@test.com", 3.0, true);
                store.add(entity.clone()).unwrap();

                entity.name = "Caroline".to_string();
                let updated = store.update(entity).unwrap();

                assert_eq!(updated.name, "Caroline");
                assert_eq!(
                    store.get_by_id(&EntityId::from(7)).unwrap().name,
                    "Caroline"
                );
            }

            #[test]
            fn test_update_nonexistent() {
                let store = $factory;
                let err = store
                    .update(create_test_entity(9, "Ghost", "g@test.com", 0.0, false))
                    .unwrap_err();
                assert_eq!(err.error_code(), "ENTITY_NOT_FOUND");
            }

            #[test]
            fn test_remove_existing() {
                let store = $factory;
                store
                    .add(create_test_entity(1, "Alice", "a@test.com", 1.0, true))
                    .unwrap();

                let removed = store.remove(&EntityId::from(1)).unwrap();

                assert_eq!(removed.map(|e| e.id), Some(1));
                assert!(store.get_all().is_empty());
            }

            #[test]
            fn test_remove_nonexistent() {
                let store = $factory;
                assert!(store.remove(&EntityId::from(1)).unwrap().is_none());
            }

            // ==================================================================
            // Reactive selects
            // ==================================================================

            #[test]
            fn test_select_all_replays_and_tracks() {
                let store = $factory;
                store
                    .add(create_test_entity(1, "Alice", "a@test.com", 1.0, true))
                    .unwrap();

                let (seen, _sub) = record(&store.select_all());
                store
                    .add(create_test_entity(2, "Bob", "b@test.com", 2.0, true))
                    .unwrap();
                store.remove(&EntityId::from(1)).unwrap();

                let lengths: Vec<usize> =
                    seen.lock().unwrap().iter().map(BaseCollection::len).collect();
                assert_eq!(lengths, vec![1, 2, 1]);
            }

            #[test]
            fn test_select_by_id_tracks_one_entity() {
                let store = $factory;
                let (seen, _sub) = record(&store.select_by_id(&EntityId::from(5)));

                store
                    .add(create_test_entity(5, "Eve", "e@test.com", 5.0, true))
                    .unwrap();
                store
                    .add(create_test_entity(6, "Frank", "f@test.com", 6.0, true))
                    .unwrap();

                let names: Vec<Option<String>> = seen
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|e: &Option<TestEntity>| e.as_ref().map(|e| e.name.clone()))
                    .collect();
                assert_eq!(names, vec![
                    None,
                    Some("Eve".to_string()),
                    Some("Eve".to_string())
                ]);
            }

            #[test]
            fn test_select_all_keeps_insertion_order() {
                let store = $factory;
                for id in [3, 1, 2] {
                    store
                        .add(create_test_entity(id, "x", "x@test.com", 0.0, true))
                        .unwrap();
                }

                let (seen, _sub) = record(&store.select_all());
                let order: Vec<EntityId> = last(&seen)
                    .into_vec()
                    .iter()
                    .map(|e: &TestEntity| e.id())
                    .collect();
                assert_eq!(order, vec![
                    EntityId::from(3),
                    EntityId::from(1),
                    EntityId::from(2)
                ]);
            }
        }
    };
}
