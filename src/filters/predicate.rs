//! Default search predicate and search helpers
//!
//! A filter created with a `value` and no predicate matches an entity when
//! the value's text is found in one of the entity's fields. What "found"
//! means is controlled by [`SearchOptions`]:
//!
//! | option | default | effect |
//! |---|---|---|
//! | `case_sensitive` | `false` | compare text as-is instead of lowercased |
//! | `fields` | `all` | scan every field, or only the listed ones |
//! | `deep` | `false` | descend into lists and nested objects |
//! | `mode` | `contains` | substring match, or whole-text equality |

use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use crate::filters::filter::{Predicate, value_text};
use serde::{Deserialize, Serialize};

/// How the search term is compared to a field's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Contains,
    Exact,
}

/// Which fields of an entity are scanned
///
/// Serialized as a plain list of field names; an empty list means all fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum SearchFields {
    /// Every field reported by `Entity::field_names`
    #[default]
    All,
    /// Only the listed fields
    Only(Vec<String>),
}

impl From<Vec<String>> for SearchFields {
    fn from(fields: Vec<String>) -> Self {
        if fields.is_empty() {
            SearchFields::All
        } else {
            SearchFields::Only(fields)
        }
    }
}

impl From<SearchFields> for Vec<String> {
    fn from(fields: SearchFields) -> Self {
        match fields {
            SearchFields::All => Vec::new(),
            SearchFields::Only(fields) => fields,
        }
    }
}

/// Configuration of the default search predicate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub fields: SearchFields,
    pub deep: bool,
    pub mode: MatchMode,
}

impl SearchOptions {
    /// Restrict the search to the given fields
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: SearchFields::Only(fields.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    fn normalize(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    fn text_matches(&self, needle: &str, haystack: &str) -> bool {
        let haystack = self.normalize(haystack);
        match self.mode {
            MatchMode::Contains => haystack.contains(needle),
            MatchMode::Exact => haystack == needle,
        }
    }

    fn value_matches(&self, needle: &str, value: &FieldValue, depth_allowed: bool) -> bool {
        match value {
            FieldValue::List(items) if depth_allowed => items
                .iter()
                .any(|item| self.value_matches(needle, item, self.deep)),
            FieldValue::Object(map) if depth_allowed => map
                .values()
                .any(|item| self.value_matches(needle, item, self.deep)),
            other => other
                .to_search_text()
                .is_some_and(|text| self.text_matches(needle, &text)),
        }
    }
}

/// Whether `term` is found in any searched field of `entity`
pub fn search_filter<E: Entity>(term: &str, entity: &E, options: &SearchOptions) -> bool {
    let needle = options.normalize(term);
    let fields = match &options.fields {
        SearchFields::All => entity.field_names(),
        SearchFields::Only(fields) => fields.clone(),
    };

    fields.iter().any(|field| {
        entity
            .field_value(field)
            .is_some_and(|value| options.value_matches(&needle, &value, options.deep))
    })
}

/// Whether `term` is found in one field of `entity`
///
/// A list field matches when any of its scalar elements matches, whether or
/// not `deep` is set.
pub fn search_filter_in<E: Entity>(
    term: &str,
    entity: &E,
    field: &str,
    options: &SearchOptions,
) -> bool {
    let needle = options.normalize(term);
    match entity.field_value(field) {
        Some(FieldValue::List(items)) => items
            .iter()
            .any(|item| options.value_matches(&needle, item, options.deep)),
        Some(value) => options.value_matches(&needle, &value, options.deep),
        None => false,
    }
}

/// Predicate installed on filters that carry a value but no predicate
///
/// The filter's value is read at evaluation time; a filter without a value
/// lets every entity through.
pub fn default_predicate<E: Entity>(options: SearchOptions) -> Predicate<E> {
    Predicate::new(move |entity: &E, _index, _candidates, filter| {
        match filter.value.as_ref() {
            Some(value) => search_filter(&value_text(value), entity, &options),
            None => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_is_case_insensitive_by_default() {
        let entity = json!({"id": 3, "name": "Apple Pie"});
        assert!(search_filter("apple", &entity, &SearchOptions::default()));
        assert!(!search_filter(
            "apple",
            &entity,
            &SearchOptions::default().case_sensitive(true)
        ));
    }

    #[test]
    fn test_search_scans_numbers_as_text() {
        let entity = json!({"id": 42, "name": "x"});
        assert!(search_filter("42", &entity, &SearchOptions::default()));
    }

    #[test]
    fn test_search_restricted_fields() {
        let entity = json!({"title": "rust", "body": "apple"});
        let options = SearchOptions::only(["title"]);
        assert!(!search_filter("apple", &entity, &options));
        assert!(search_filter("RUST", &entity, &options));
    }

    #[test]
    fn test_shallow_search_skips_nested_values() {
        let entity = json!({"name": "box", "tags": ["fruit", "red"], "owner": {"name": "Ann"}});
        assert!(!search_filter("fruit", &entity, &SearchOptions::default()));
        assert!(!search_filter("ann", &entity, &SearchOptions::default()));

        let deep = SearchOptions::default().deep(true);
        assert!(search_filter("fruit", &entity, &deep));
        assert!(search_filter("ann", &entity, &deep));
    }

    #[test]
    fn test_exact_mode() {
        let entity = json!({"status": "open"});
        let exact = SearchOptions::default().mode(MatchMode::Exact);
        assert!(search_filter("OPEN", &entity, &exact));
        assert!(!search_filter("op", &entity, &exact));
    }

    #[test]
    fn test_search_filter_in_lists() {
        let entity = json!({"tags": ["fruit", "red"], "name": "fruit salad"});
        let options = SearchOptions::default();
        assert!(search_filter_in("red", &entity, "tags", &options));
        assert!(!search_filter_in("salad", &entity, "tags", &options));
        assert!(!search_filter_in("red", &entity, "missing", &options));
    }

    #[test]
    fn test_search_options_yaml_shape() {
        let options: SearchOptions =
            serde_yaml::from_str("case_sensitive: true\nfields: [name]\n").unwrap();
        assert!(options.case_sensitive);
        assert_eq!(options.fields, SearchFields::Only(vec!["name".to_string()]));
        assert_eq!(options.mode, MatchMode::Contains);

        let all: SearchOptions = serde_yaml::from_str("fields: []\n").unwrap();
        assert_eq!(all.fields, SearchFields::All);
    }
}
