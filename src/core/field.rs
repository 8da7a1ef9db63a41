//! Field value types used for searching and sorting

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    List(Vec<FieldValue>),
    Object(IndexMap<String, FieldValue>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float; integers are widened
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Scalars are everything except lists, objects and null
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            FieldValue::List(_) | FieldValue::Object(_) | FieldValue::Null
        )
    }

    /// Text used by the search predicates; `None` for non-scalars
    pub fn to_search_text(&self) -> Option<String> {
        match self {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Uuid(u) => Some(u.to_string()),
            FieldValue::DateTime(d) => Some(d.to_rfc3339()),
            FieldValue::List(_) | FieldValue::Object(_) | FieldValue::Null => None,
        }
    }

    /// Total ordering used when sorting by a field
    ///
    /// Numbers compare numerically across integer/float, strings compare
    /// case-insensitively. Values of different kinds are ranked
    /// null < boolean < number < string < uuid < datetime < list < object.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => {
                a.to_uppercase().cmp(&b.to_uppercase())
            }
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (
                FieldValue::Integer(_) | FieldValue::Float(_),
                FieldValue::Integer(_) | FieldValue::Float(_),
            ) => {
                let a = self.as_float().unwrap_or_default();
                let b = other.as_float().unwrap_or_default();
                a.total_cmp(&b)
            }
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::List(a), FieldValue::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (FieldValue::Object(a), FieldValue::Object(b)) => a.len().cmp(&b.len()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Boolean(_) => 1,
            FieldValue::Integer(_) | FieldValue::Float(_) => 2,
            FieldValue::String(_) => 3,
            FieldValue::Uuid(_) => 4,
            FieldValue::DateTime(_) => 5,
            FieldValue::List(_) => 6,
            FieldValue::Object(_) => 7,
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::from(&value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

macro_rules! integer_field_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Integer(value as i64)
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => FieldValue::Integer(i),
            Err(_) => FieldValue::Float(value as f64),
        }
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(value: Vec<T>) -> Self {
        FieldValue::List(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_string() {
        let value = FieldValue::String("test".to_string());
        assert_eq!(value.as_string(), Some("test"));
        assert_eq!(value.as_integer(), None);
        assert!(!value.is_null());
        assert!(value.is_scalar());
    }

    #[test]
    fn test_field_value_integer() {
        let value = FieldValue::Integer(42);
        assert_eq!(value.as_integer(), Some(42));
        assert_eq!(value.as_float(), Some(42.0));
        assert_eq!(value.to_search_text().as_deref(), Some("42"));
    }

    #[test]
    fn test_strings_compare_case_insensitively() {
        let a = FieldValue::from("apple");
        let b = FieldValue::from("Banana");
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(
            FieldValue::from("ABC").compare(&FieldValue::from("abc")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_numbers_compare_across_kinds() {
        assert_eq!(
            FieldValue::Integer(2).compare(&FieldValue::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::Float(3.0).compare(&FieldValue::Integer(3)),
            Ordering::Equal
        );
        assert_eq!(
            FieldValue::Float(f64::NAN).compare(&FieldValue::Float(f64::NAN)),
            Ordering::Equal
        );
        assert_eq!(
            FieldValue::Float(1.0).compare(&FieldValue::Float(f64::NAN)),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_kinds_use_rank() {
        assert_eq!(
            FieldValue::Null.compare(&FieldValue::Integer(0)),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::from("1").compare(&FieldValue::Integer(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_from_json_value() {
        let value = FieldValue::from(json!({"a": [1, "b"], "c": null}));
        match value {
            FieldValue::Object(map) => {
                assert_eq!(
                    map["a"],
                    FieldValue::List(vec![FieldValue::Integer(1), FieldValue::from("b")])
                );
                assert!(map["c"].is_null());
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_option_and_vec_conversions() {
        assert!(FieldValue::from(None::<i32>).is_null());
        assert_eq!(FieldValue::from(Some(3)), FieldValue::Integer(3));
        assert!(!FieldValue::from(vec!["x", "y"]).is_scalar());
    }
}
