//! Filters: records, default predicate, evaluation pipeline and registry

pub mod filter;
pub mod pipeline;
pub mod predicate;
pub mod registry;

pub use filter::{
    DEFAULT_ORDER, Filter, FilterDefaults, FilterId, FilterParams, Predicate, create_filter,
    create_filter_with,
};
pub use pipeline::{PipelineOutput, apply_filters, apply_sort, run_pipeline};
pub use predicate::{
    MatchMode, SearchFields, SearchOptions, default_predicate, search_filter, search_filter_in,
};
pub use registry::FiltersRegistry;
