//! Typed error handling for the filters library
//!
//! # Error Categories
//!
//! - [`FilterError`]: a filter that cannot be built (configuration error)
//! - [`PredicateError`]: a predicate that failed while evaluating an entity
//! - [`RegistryError`]: operations on a registry that was destroyed
//! - [`StoreError`]: errors raised by keyed collections and entity stores
//! - [`ConfigError`]: errors related to configuration parsing and validation
//! - [`DataSourceError`]: misuse of a paginated data source
//!
//! Lookup misses (`get_filter_value`, `remove_filter` on an unknown id) are
//! not errors and never produce one of these.
//!
//! # Example
//!
//! ```rust,ignore
//! match registry.set_filter(FilterParams::new().id("status")) {
//!     Ok(id) => println!("active filter {}", id),
//!     Err(FiltersError::Filter(FilterError::MissingPredicate { id })) => {
//!         eprintln!("filter {} needs a value or a predicate", id);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use serde::Serialize;
use std::fmt;

/// The main error type for the filters library
#[derive(Debug, Clone)]
pub enum FiltersError {
    /// Filter construction errors
    Filter(FilterError),

    /// Predicate evaluation errors
    Predicate(PredicateError),

    /// Registry lifecycle errors
    Registry(RegistryError),

    /// Store errors
    Store(StoreError),

    /// Configuration errors
    Config(ConfigError),

    /// Data source errors
    DataSource(DataSourceError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for FiltersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiltersError::Filter(e) => write!(f, "{}", e),
            FiltersError::Predicate(e) => write!(f, "{}", e),
            FiltersError::Registry(e) => write!(f, "{}", e),
            FiltersError::Store(e) => write!(f, "{}", e),
            FiltersError::Config(e) => write!(f, "{}", e),
            FiltersError::DataSource(e) => write!(f, "{}", e),
            FiltersError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for FiltersError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FiltersError::Filter(e) => Some(e),
            FiltersError::Predicate(e) => Some(e),
            FiltersError::Registry(e) => Some(e),
            FiltersError::Store(e) => Some(e),
            FiltersError::Config(e) => Some(e),
            FiltersError::DataSource(e) => Some(e),
            FiltersError::Internal(_) => None,
        }
    }
}

impl FiltersError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            FiltersError::Filter(e) => e.error_code(),
            FiltersError::Predicate(_) => "PREDICATE_FAILED",
            FiltersError::Registry(e) => e.error_code(),
            FiltersError::Store(e) => e.error_code(),
            FiltersError::Config(_) => "CONFIG_ERROR",
            FiltersError::DataSource(e) => e.error_code(),
            FiltersError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller built something wrong (as opposed to a runtime failure)
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, FiltersError::Filter(_) | FiltersError::Config(_))
    }
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Errors raised while building a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Neither a predicate nor a value was supplied, so nothing can be evaluated
    MissingPredicate { id: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::MissingPredicate { id } => write!(
                f,
                "Filter '{}' has neither a predicate nor a value to search for",
                id
            ),
        }
    }
}

impl std::error::Error for FilterError {}

impl FilterError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FilterError::MissingPredicate { .. } => "FILTER_MISSING_PREDICATE",
        }
    }
}

impl From<FilterError> for FiltersError {
    fn from(err: FilterError) -> Self {
        FiltersError::Filter(err)
    }
}

// =============================================================================
// Predicate Errors
// =============================================================================

/// A predicate failed while evaluating one entity
///
/// The pipeline skips the failing filter for the whole pass and publishes
/// this error on the registry's error stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateError {
    /// Id of the filter whose predicate failed
    pub filter_id: String,
    /// Position of the entity in the candidate sequence
    pub index: usize,
    /// Error message returned by the predicate
    pub message: String,
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Predicate of filter '{}' failed at index {}: {}",
            self.filter_id, self.index, self.message
        )
    }
}

impl std::error::Error for PredicateError {}

impl From<PredicateError> for FiltersError {
    fn from(err: PredicateError) -> Self {
        FiltersError::Predicate(err)
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors related to the filter registry lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// The registry was destroyed and no longer accepts filters
    Destroyed { name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Destroyed { name } => {
                write!(f, "Filter registry '{}' has been destroyed", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

impl RegistryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::Destroyed { .. } => "REGISTRY_DESTROYED",
        }
    }
}

impl From<RegistryError> for FiltersError {
    fn from(err: RegistryError) -> Self {
        FiltersError::Registry(err)
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by keyed collections and entity stores
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No entity with this id
    NotFound { store: String, id: String },

    /// An entity with this id is already stored
    AlreadyExists { store: String, id: String },

    /// The entity has no usable id, so it cannot be keyed
    MissingId { store: String },

    /// A lock was poisoned by a panicking writer
    LockPoisoned { store: String, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { store, id } => {
                write!(f, "Entity with id '{}' not found in store '{}'", id, store)
            }
            StoreError::AlreadyExists { store, id } => {
                write!(
                    f,
                    "Entity with id '{}' already exists in store '{}'",
                    id, store
                )
            }
            StoreError::MissingId { store } => {
                write!(f, "Entity without an id cannot be stored in '{}'", store)
            }
            StoreError::LockPoisoned { store, message } => {
                write!(f, "Failed to acquire lock on store '{}': {}", store, message)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "ENTITY_NOT_FOUND",
            StoreError::AlreadyExists { .. } => "ENTITY_ALREADY_EXISTS",
            StoreError::MissingId { .. } => "ENTITY_MISSING_ID",
            StoreError::LockPoisoned { .. } => "STORE_LOCK_POISONED",
        }
    }
}

impl From<StoreError> for FiltersError {
    fn from(err: StoreError) -> Self {
        FiltersError::Store(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse configuration
    ParseError { file: Option<String>, message: String },

    /// Configuration file not found
    FileNotFound { path: String },

    /// Invalid configuration value
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::FileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, message
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FiltersError {
    fn from(err: ConfigError) -> Self {
        FiltersError::Config(err)
    }
}

// =============================================================================
// Data Source Errors
// =============================================================================

/// Errors related to the paginated data source
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceError {
    /// The data source was disconnected; a fresh instance is required
    Disconnected,
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::Disconnected => {
                write!(f, "Data source is disconnected and cannot be reconnected")
            }
        }
    }
}

impl std::error::Error for DataSourceError {}

impl DataSourceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DataSourceError::Disconnected => "DATA_SOURCE_DISCONNECTED",
        }
    }
}

impl From<DataSourceError> for FiltersError {
    fn from(err: DataSourceError) -> Self {
        FiltersError::DataSource(err)
    }
}
