//! Macros for reducing boilerplate when defining filterable entities
//!
//! These macros generate the `Entity` implementation the pipeline needs:
//! identity, dynamic field access and the list of searchable fields.

/// Implement `Entity` for an existing struct
///
/// The id field is exposed as a regular field too; do not list it again.
/// Every listed field must be convertible into `FieldValue`.
///
/// # Example
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct Todo {
///     id: u32,
///     title: String,
///     completed: bool,
/// }
///
/// impl_entity!(Todo, id: id, [title, completed]);
/// ```
#[macro_export]
macro_rules! impl_entity {
    (
        $type:ty,
        id: $id_field:ident,
        [ $( $field:ident ),* $(,)? ]
    ) => {
        impl $crate::core::entity::Entity for $type {
            fn id(&self) -> $crate::core::entity::EntityId {
                $crate::core::entity::EntityId::from(self.$id_field.clone())
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                match field {
                    stringify!($id_field) => {
                        Some($crate::core::field::FieldValue::from(self.$id_field.clone()))
                    }
                    $(
                        stringify!($field) => {
                            Some($crate::core::field::FieldValue::from(self.$field.clone()))
                        }
                    )*
                    _ => None,
                }
            }

            fn field_names(&self) -> Vec<String> {
                vec![
                    stringify!($id_field).to_string(),
                    $( stringify!($field).to_string() ),*
                ]
            }
        }
    };
}

/// Define a struct and its `Entity` implementation in one go
///
/// The struct gets an `id` field of the given type, the listed fields, and
/// `Debug`, `Clone`, `PartialEq`, `Serialize` and `Deserialize` derives.
///
/// # Example
///
/// ```rust,ignore
/// use this_filters::prelude::*;
///
/// filterable_entity!(Product {
///     id: i64,
///     name: String,
///     price: f64,
///     tags: Vec<String>,
/// });
///
/// let product = Product::new(1, "Apple".to_string(), 0.5, vec![]);
/// ```
#[macro_export]
macro_rules! filterable_entity {
    (
        $( #[$meta:meta] )*
        $type:ident {
            id: $id_type:ty,
            $( $field:ident : $field_type:ty ),* $(,)?
        }
    ) => {
        $( #[$meta] )*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this entity
            pub id: $id_type,
            $( pub $field : $field_type ),*
        }

        impl $type {
            /// Create a new instance of this entity
            #[allow(clippy::too_many_arguments)]
            pub fn new(id: $id_type, $( $field: $field_type ),*) -> Self {
                Self { id, $( $field ),* }
            }
        }

        $crate::impl_entity!($type, id: id, [ $( $field ),* ]);
    };
}
