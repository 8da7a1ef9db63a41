//! Core module containing fundamental traits and types for the library

pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod query;
pub mod store;

pub use entity::{Entity, EntityId};
pub use error::{FiltersError, PredicateError};
pub use events::{EventBus, EventEnvelope, FiltersEvent};
pub use field::FieldValue;
pub use query::{NormalizeOptions, NormalizedFilters, Order, PaginationMeta, SortBy};
pub use store::{BaseCollection, EntitySource, EntityStore, KeyedCollection};
