//! Entity traits defining what the filtering pipeline needs from stored data

use crate::core::field::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of an entity inside a keyed store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Uuid(Uuid),
    Str(String),
}

impl EntityId {
    /// The empty string id given to entities without a usable id
    pub fn is_blank(&self) -> bool {
        matches!(self, EntityId::Str(s) if s.is_empty())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(i) => write!(f, "{}", i),
            EntityId::Uuid(u) => write!(f, "{}", u),
            EntityId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Int(value as i64)
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        EntityId::Int(value as i64)
    }
}

impl From<Uuid> for EntityId {
    fn from(value: Uuid) -> Self {
        EntityId::Uuid(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Str(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Str(value.to_string())
    }
}

impl TryFrom<&FieldValue> for EntityId {
    type Error = ();

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(i) => Ok(EntityId::Int(*i)),
            FieldValue::Uuid(u) => Ok(EntityId::Uuid(*u)),
            FieldValue::String(s) => Ok(Uuid::parse_str(s)
                .map(EntityId::Uuid)
                .unwrap_or_else(|_| EntityId::Str(s.clone()))),
            _ => Err(()),
        }
    }
}

/// Base trait for every entity the filters operate on.
///
/// The pipeline only needs three things from an entity:
/// - id: stable identity, used by keyed stores
/// - field_value: dynamic field access for sorting and searching
/// - field_names: the entity's own fields, in declaration order, scanned by
///   the default search predicate
pub trait Entity: Clone + Send + Sync + 'static {
    /// Get the unique identifier for this entity instance
    fn id(&self) -> EntityId;

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Names of the fields exposed through `field_value`
    fn field_names(&self) -> Vec<String>;

    /// All fields as `(name, value)` pairs
    fn fields(&self) -> Vec<(String, FieldValue)> {
        self.field_names()
            .into_iter()
            .filter_map(|name| self.field_value(&name).map(|value| (name, value)))
            .collect()
    }
}

/// JSON objects are entities; the `id` field provides identity
///
/// A row whose `id` is absent, null or not a scalar, and any non-object
/// value, gets the blank id `EntityId::Str("")` (see [`EntityId::is_blank`]).
/// Such rows cannot share a keyed store: `InMemoryEntityStore` rejects them
/// with `StoreError::MissingId`.
impl Entity for serde_json::Value {
    fn id(&self) -> EntityId {
        self.get("id")
            .map(FieldValue::from)
            .and_then(|v| EntityId::try_from(&v).ok())
            .unwrap_or_else(|| EntityId::Str(String::new()))
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        self.as_object()?.get(field).map(FieldValue::from)
    }

    fn field_names(&self) -> Vec<String> {
        self.as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default()
    }
}
