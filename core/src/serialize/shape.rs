//! Static description of serialization output.

use std::borrow::Cow;

use compact_str::CompactString;
use relgraph_types::{EntityType, ScalarType};
use serde_json::{Map, Value as Json, json};

/// Shape of a serialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Unknown; anything may appear
    Any,
    /// A scalar of the given type
    Scalar(ScalarType),
    /// A mapping with known keys
    Record(RecordShape),
    /// A sequence of values of one shape
    List(Box<Shape>),
    /// The inner shape or `null`
    Nullable(Box<Shape>),
}

impl Shape {
    pub fn list(inner: Shape) -> Self {
        Shape::List(Box::new(inner))
    }

    /// Wraps in [`Shape::Nullable`] unless already nullable.
    pub fn nullable(inner: Shape) -> Self {
        match inner {
            Shape::Nullable(_) | Shape::Any => inner,
            other => Shape::Nullable(Box::new(other)),
        }
    }

    /// Record shape of an entity type's default serialization.
    pub fn of_entity(ty: &EntityType, include_foreign_keys: bool) -> Self {
        let fields = ty
            .attributes
            .iter()
            .filter(|a| include_foreign_keys || !a.is_foreign_key())
            .map(|a| {
                let scalar = Shape::Scalar(a.scalar_type);
                Field {
                    name: CompactString::from(a.name.as_ref()),
                    shape: if a.nullable { Shape::nullable(scalar) } else { scalar },
                    doc: a.doc.clone(),
                }
            })
            .collect();
        Shape::Record(RecordShape { fields, open: false })
    }

    /// The record shape, looking through `Nullable`.
    pub fn as_record(&self) -> Option<&RecordShape> {
        match self {
            Shape::Record(r) => Some(r),
            Shape::Nullable(inner) => inner.as_record(),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Shape::List(_))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Shape::Nullable(_) | Shape::Any)
    }

    /// Whether `value` could have been produced with this shape.
    ///
    /// Scalars admit `null`, as absent attributes serialize to it. Closed
    /// records need exactly their fields, in order.
    pub fn admits(&self, value: &Json) -> bool {
        match (self, value) {
            (Shape::Any, _) | (Shape::Nullable(_), Json::Null) | (Shape::Scalar(_), Json::Null) => {
                true
            }
            (Shape::Nullable(inner), v) => inner.admits(v),
            (Shape::List(inner), Json::Array(items)) => items.iter().all(|i| inner.admits(i)),
            (Shape::Record(record), Json::Object(map)) => record.admits(map),
            (Shape::Scalar(t), v) => match t {
                ScalarType::Bool => v.is_boolean(),
                ScalarType::Integer => v.is_i64() || v.is_u64(),
                ScalarType::Real => v.is_number(),
                ScalarType::Text => v.is_string(),
                ScalarType::Blob => v
                    .as_array()
                    .is_some_and(|b| b.iter().all(|byte| byte.as_u64().is_some_and(|n| n <= 255))),
                ScalarType::Any => true,
            },
            _ => false,
        }
    }

    /// Renders this shape as a JSON Schema fragment.
    pub fn to_json_schema(&self) -> Json {
        match self {
            Shape::Any => json!({}),
            Shape::Scalar(ScalarType::Blob) => json!({
                "type": "array",
                "items": { "type": "integer", "minimum": 0, "maximum": 255 },
            }),
            Shape::Scalar(t) => match t.json_type() {
                Some(name) => json!({ "type": name }),
                None => json!({}),
            },
            Shape::Record(r) => r.to_json_schema(),
            Shape::List(inner) => json!({ "type": "array", "items": inner.to_json_schema() }),
            Shape::Nullable(inner) => json!({ "anyOf": [inner.to_json_schema(), { "type": "null" }] }),
        }
    }
}

/// Keys of a record-shaped value, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordShape {
    pub fields: Vec<Field>,
    /// Further keys unknown to the schema may appear
    pub open: bool,
}

impl RecordShape {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn admits(&self, map: &Map<String, Json>) -> bool {
        let keys_match = self.open
            || (map.len() == self.fields.len()
                && self.keys().zip(map.keys()).all(|(a, b)| a == b));
        keys_match
            && self
                .fields
                .iter()
                .all(|f| map.get(f.name.as_str()).is_some_and(|v| f.shape.admits(v)))
    }

    fn to_json_schema(&self) -> Json {
        let mut properties = Map::new();
        for f in &self.fields {
            properties.insert(f.name.to_string(), f.to_json_schema());
        }
        let required: Vec<Json> = self.fields.iter().map(|f| Json::from(f.name.as_str())).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.open,
        })
    }
}

/// A named, documented entry of a record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: CompactString,
    pub shape: Shape,
    pub doc: Option<Cow<'static, str>>,
}

impl Field {
    fn to_json_schema(&self) -> Json {
        let mut schema = self.shape.to_json_schema();
        if let (Some(doc), Json::Object(map)) = (&self.doc, &mut schema) {
            map.insert("description".into(), Json::from(doc.as_ref()));
        }
        schema
    }
}

/// Shape of a whole serialization result: one field per emitted root key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub root: RecordShape,
}

impl Schema {
    /// Looks up a root key.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.root.field(name)
    }

    /// Root keys in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Renders a JSON Schema (draft 2020-12) document.
    pub fn to_json_schema(&self) -> Json {
        let mut doc = self.root.to_json_schema();
        if let Json::Object(map) = &mut doc {
            map.insert(
                "$schema".into(),
                Json::from("https://json-schema.org/draft/2020-12/schema"),
            );
        }
        doc
    }
}
