//! Configuration loading and management

use crate::core::error::ConfigError;
use crate::core::query::NormalizeOptions;
use crate::filters::filter::{DEFAULT_ORDER, FilterDefaults};
use crate::filters::predicate::SearchOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pager defaults applied to paginators built from configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorConfig {
    /// Items per page
    pub page_size: usize,

    /// Page sizes offered to the user
    pub page_size_options: Vec<usize>,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_size_options: vec![5, 10, 25, 100],
        }
    }
}

/// Complete configuration of a filter registry and its data source
///
/// Every field has a default, so an empty document is a valid configuration:
///
/// ```yaml
/// store_name: todosFilters
/// default_order: 10
/// search_filter_id: search
/// search:
///   case_sensitive: false
///   fields: [title, description]
/// normalize:
///   with_sort: true
/// paginator:
///   page_size: 25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Registry name used in logs and events
    pub store_name: Option<String>,

    /// Order given to filters that do not set one
    pub default_order: i32,

    /// Id of the filter driven by the data source's search setter
    pub search_filter_id: String,

    /// Behaviour of the default search predicate
    pub search: SearchOptions,

    /// Shape of the normalized (server-side) filters
    pub normalize: NormalizeOptions,

    pub paginator: PaginatorConfig,

    /// Buffered events per async receiver before it starts lagging
    pub event_bus_capacity: usize,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            store_name: None,
            default_order: DEFAULT_ORDER,
            search_filter_id: "search".to_string(),
            search: SearchOptions::default(),
            normalize: NormalizeOptions::default(),
            paginator: PaginatorConfig::default(),
            event_bus_capacity: 1024,
        }
    }
}

impl FiltersConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Filters configuration loaded");
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the data source cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paginator.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paginator.page_size".to_string(),
                value: "0".to_string(),
                message: "page size must be at least 1".to_string(),
            });
        }
        if let Some(size) = self.paginator.page_size_options.iter().find(|s| **s == 0) {
            return Err(ConfigError::InvalidValue {
                field: "paginator.page_size_options".to_string(),
                value: size.to_string(),
                message: "page size options must be at least 1".to_string(),
            });
        }
        if self.event_bus_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_bus_capacity".to_string(),
                value: "0".to_string(),
                message: "event bus capacity must be at least 1".to_string(),
            });
        }
        if self.search_filter_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "search_filter_id".to_string(),
                value: String::new(),
                message: "search filter id cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults handed to the filter factory
    pub fn filter_defaults(&self) -> FilterDefaults {
        FilterDefaults {
            order: self.default_order,
            search: self.search.clone(),
        }
    }

    /// Builder: set the registry name
    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::predicate::SearchFields;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FiltersConfig::default();

        assert_eq!(config.default_order, 10);
        assert_eq!(config.search_filter_id, "search");
        assert_eq!(config.paginator.page_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = FiltersConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, FiltersConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let yaml = r#"
store_name: todosFilters
default_order: 3
search:
  case_sensitive: true
  fields: [title]
normalize:
  with_sort: true
  sort_by_key: orderBy
paginator:
  page_size: 25
"#;
        let config = FiltersConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.store_name.as_deref(), Some("todosFilters"));
        assert_eq!(config.filter_defaults().order, 3);
        assert!(config.search.case_sensitive);
        assert_eq!(
            config.search.fields,
            SearchFields::Only(vec!["title".to_string()])
        );
        assert!(config.normalize.with_sort);
        assert_eq!(config.normalize.sort_by_key, "orderBy");
        assert_eq!(config.normalize.sort_by_order_key, "sortByOrder");
        assert_eq!(config.paginator.page_size, 25);
        assert_eq!(config.paginator.page_size_options, vec![5, 10, 25, 100]);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = FiltersConfig::from_yaml_str("paginator:\n  page_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "paginator.page_size"));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let err = FiltersConfig::from_yaml_str("default_order: [not, a, number]").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }

    #[test]
    fn test_yaml_serialization() {
        let config = FiltersConfig::default().with_store_name("fruits");
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = FiltersConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_filter_id: q").unwrap();

        let config = FiltersConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.search_filter_id, "q");

        let err = FiltersConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
