//! Entity to output value conversion.

use std::fmt;
use std::sync::Arc;

use relgraph_types::{Entity, Record, Value};
use serde_json::{Map, Number, Value as Json};

use super::shape::Shape;
use crate::error::BoxError;
use crate::template::SlotKind;

/// Signature of a custom base transform.
pub type TransformFn = Arc<dyn Fn(&Entity) -> Result<Json, BoxError> + Send + Sync>;

/// Base conversion of a node's entity into an output value.
///
/// Every slot carries one; it is chosen when the slot is declared, from the
/// slot declaration, then the per-type registrations of the
/// [`GraphSpec`](crate::GraphSpec), then the configuration defaults.
#[derive(Clone)]
pub enum Transform {
    /// Records become a mapping of every attribute (absent attributes as `null`)
    Record { include_foreign_keys: bool },
    /// Scalars as-is, records as a mapping of every attribute
    Identity,
    /// Caller-supplied conversion with a declared output shape
    Custom { f: TransformFn, shape: Shape },
}

impl Transform {
    /// Custom transform whose output shape is unknown.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Entity) -> Result<Json, BoxError> + Send + Sync + 'static,
    {
        Self::shaped(Shape::Any, f)
    }

    /// Custom transform with a declared output shape.
    pub fn shaped<F>(shape: Shape, f: F) -> Self
    where
        F: Fn(&Entity) -> Result<Json, BoxError> + Send + Sync + 'static,
    {
        Transform::Custom {
            f: Arc::new(f),
            shape,
        }
    }

    pub fn apply(&self, entity: &Entity) -> Result<Json, BoxError> {
        match self {
            Transform::Record {
                include_foreign_keys,
            } => Ok(entity_to_json(entity, *include_foreign_keys)),
            Transform::Identity => Ok(entity_to_json(entity, true)),
            Transform::Custom { f, .. } => f(entity),
        }
    }

    /// Output shape for nodes of a slot of `kind`.
    pub fn shape(&self, kind: &SlotKind) -> Shape {
        match (self, kind) {
            (Transform::Custom { shape, .. }, _) => shape.clone(),
            (Transform::Record { include_foreign_keys }, SlotKind::Record(ty)) => {
                Shape::of_entity(ty, *include_foreign_keys)
            }
            (Transform::Identity, SlotKind::Record(ty)) => Shape::of_entity(ty, true),
            (_, SlotKind::Scalar(t)) => Shape::Scalar(*t),
            (_, SlotKind::Untyped | SlotKind::Graph(_)) => Shape::Any,
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Record {
                include_foreign_keys,
            } => f
                .debug_struct("Record")
                .field("include_foreign_keys", include_foreign_keys)
                .finish(),
            Transform::Identity => f.write_str("Identity"),
            Transform::Custom { shape, .. } => {
                f.debug_struct("Custom").field("shape", shape).finish_non_exhaustive()
            }
        }
    }
}

/// Converts a scalar into JSON. Non-finite reals become `null`, blobs
/// become byte arrays.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Real(r) => Number::from_f64(*r).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(b) => Json::Array(b.iter().map(|&byte| Json::from(byte)).collect()),
    }
}

/// Converts a record into a JSON object in attribute order.
pub fn record_to_json(record: &Record, include_foreign_keys: bool) -> Json {
    let mut map = Map::with_capacity(record.entity_type().len());
    for (attr, value) in record.iter() {
        if !include_foreign_keys && attr.is_foreign_key() {
            continue;
        }
        map.insert(
            attr.name.to_string(),
            value.map_or(Json::Null, value_to_json),
        );
    }
    Json::Object(map)
}

fn entity_to_json(entity: &Entity, include_foreign_keys: bool) -> Json {
    match entity {
        Entity::Record(r) => record_to_json(r, include_foreign_keys),
        Entity::Scalar(v) => value_to_json(v),
    }
}
