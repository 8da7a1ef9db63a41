//! Storage implementations backing registries and base entity stores

pub mod in_memory;

pub use in_memory::{InMemoryCollection, InMemoryEntityStore};
