//! # This-Filters
//!
//! Reactive filtering, sorting and pagination on top of entity stores.
//!
//! ## Features
//!
//! - **Filter Registry**: Named filters with ordering, visibility and server flags, keyed by id
//! - **Default Search**: Filters with a value and no predicate search the entity's fields
//! - **Deterministic Pipeline**: Filters run by order, AND-combined, then a stable sort
//! - **Failure Isolation**: A failing predicate only disables its own filter
//! - **Server Mode**: Server-flagged filters are normalized into query parameters
//! - **Paginated Data Source**: Page slicing with automatic page index correction
//! - **Async Bridge**: Registry events on a tokio broadcast bus, views as watch channels
//! - **Configuration-Based**: Defaults loaded from YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use this_filters::prelude::*;
//!
//! filterable_entity!(Todo {
//!     id: i64,
//!     title: String,
//!     completed: bool,
//! });
//!
//! let store = Arc::new(InMemoryEntityStore::with_entities("todos", vec![
//!     Todo::new(1, "Buy apples".to_string(), false),
//!     Todo::new(2, "Walk the dog".to_string(), true),
//! ])?);
//!
//! let data_source = PaginatedDataSource::new(store);
//! data_source.set_paginator(Paginator::new(10));
//! let rows = data_source.connect()?;
//! let _sub = rows.subscribe(|page: &Vec<Todo>| println!("{} rows", page.len()));
//!
//! data_source.set_search("apple")?;
//! data_source.set_filter(
//!     FilterParams::new()
//!         .id("open")
//!         .predicate_fn(|todo: &Todo| !todo.completed),
//! )?;
//! data_source.set_default_sort("title", SortDirection::Asc);
//! ```

pub mod config;
pub mod core;
pub mod datasource;
pub mod entities;
pub mod filters;
pub mod logging;
pub mod reactive;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Entity, EntityId},
        error::{
            ConfigError, DataSourceError, FilterError, FiltersError, PredicateError,
            RegistryError, StoreError,
        },
        events::{EventBus, EventEnvelope, FiltersEvent},
        field::FieldValue,
        query::{NormalizeOptions, NormalizedFilters, Order, PaginationMeta, SortBy},
        store::{BaseCollection, EntitySource, EntityStore, KeyedCollection},
    };

    // === Macros ===
    pub use crate::{filterable_entity, impl_entity};

    // === Filters ===
    pub use crate::filters::{
        Filter, FilterId, FilterParams, FiltersRegistry, MatchMode, Predicate, SearchFields,
        SearchOptions, create_filter, search_filter, search_filter_in,
    };

    // === Data source ===
    pub use crate::datasource::{
        DataSourceState, PageEvent, PaginatedDataSource, Paginator, SortChange, SortControl,
        SortDirection,
    };

    // === Reactive ===
    pub use crate::reactive::{
        BehaviorSubject, Observable, Scheduler, Subject, Subscription, SubscriptionBag,
        combine_latest2, combine_latest3,
    };

    // === Storage ===
    pub use crate::storage::{InMemoryCollection, InMemoryEntityStore};

    // === Config ===
    pub use crate::config::{FiltersConfig, PaginatorConfig};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
