//! Helpers for declaring filterable entity types

#[macro_use]
pub mod macros;
