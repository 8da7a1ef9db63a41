//! Paginated data source and the widget models it drives

pub mod adapter;
pub mod paginator;
pub mod sort;

pub use adapter::{DataSourceState, PaginatedDataSource};
pub use paginator::{PageEvent, Paginator};
pub use sort::{SortChange, SortControl, SortDirection};
