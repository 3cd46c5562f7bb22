//! Entity type descriptors for relgraph
//!
//! This crate provides the data-driven description of record types consumed by
//! the graph engine:
//!
//! - [`Value`] / [`ScalarType`] - scalar values read from result rows
//! - [`AttributeDef`] / [`Attribute`] - const-friendly and runtime attribute descriptors
//! - [`EntityType`] - a record type: name, ordered attributes, primary key
//! - [`Record`] / [`Entity`] - values stored in graph nodes
//! - [`TypeRegistry`] - explicit name → descriptor registry
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization of descriptors (enabled by default)

mod attribute;
mod entity_type;
mod error;
mod record;
mod registry;
mod value;

pub use attribute::{Attribute, AttributeDef, Reference, ReferenceDef};
pub use entity_type::{EntityType, EntityTypeBuilder};
pub use error::TypeError;
pub use record::{Entity, KeyValues, Record};
pub use registry::TypeRegistry;
pub use value::{ScalarType, Value};

/// Builds a [`Record`] from `attribute => value` pairs.
///
/// Evaluates to `Result<Record, TypeError>`.
///
/// ```
/// use relgraph_types::{record, AttributeDef, EntityType, ScalarType};
///
/// const BLOG: &[AttributeDef] = &[
///     AttributeDef::new("id", ScalarType::Integer).primary_key(),
///     AttributeDef::new("title", ScalarType::Text),
/// ];
/// let blog = EntityType::from_defs("blog", BLOG).unwrap();
///
/// let r = record!(blog, { "id" => 1, "title" => "A" }).unwrap();
/// assert_eq!(r.get("title").and_then(|v| v.as_str()), Some("A"));
/// ```
#[macro_export]
macro_rules! record {
    ($ty:expr, { $($attr:literal => $value:expr),* $(,)? }) => {
        $crate::Record::from_pairs(
            &$ty,
            [$(($attr, $crate::Value::from($value))),*],
        )
    };
}
