//! Compiled serialization plans.

use compact_str::CompactString;
use relgraph_types::Entity;
use serde_json::{Map, Value as Json};

use super::shape::{Field, RecordShape, Schema, Shape};
use super::{Aggregation, Namer, Position, SerializationSpec, SlotSerializer};
use crate::error::{BoxError, SerializeError};
use crate::graph::{ContainerView, GraphView, NodeRef};
use crate::template::{GraphTemplate, Slot};
use crate::{relgraph_profile_function, relgraph_profile_scope, relgraph_trace_serialize};

/// A serialization spec resolved against a template.
///
/// Compiling checks every slot name and computes the output shape, including
/// key conflicts and pick defaults. The same plan drives data output, so a
/// plan that compiles only fails on data when a custom function does, or when
/// a custom function's output collides with a sibling key or cannot carry the
/// slot's children.
///
/// Sub-graph slots compile a nested plan against their nested template.
#[derive(Debug)]
pub struct SerializePlan<'a> {
    roots: Vec<PlanNode<'a>>,
    schema: Schema,
}

#[derive(Debug)]
struct PlanNode<'a> {
    slot: &'a Slot,
    serializer: SlotSerializer,
    /// Plan for the nested graph of each node of a sub-graph slot
    sub: Option<Box<SerializePlan<'a>>>,
    /// Emitted children with their position in the slot's declared children
    children: Vec<(usize, PlanNode<'a>)>,
    /// Whether a single node may serialize to `null`
    nullable_node: bool,
    /// Aggregated value shape
    shape: Shape,
    /// Keys a merged slot splices into its parent
    merged_keys: Vec<CompactString>,
}

impl<'a> SerializePlan<'a> {
    pub fn compile(template: &'a GraphTemplate, spec: &SerializationSpec) -> Result<Self, SerializeError> {
        relgraph_profile_function!();
        for (name, _) in spec.iter() {
            if !template.contains(name) {
                return Err(SerializeError::UnknownSlot(name.into()));
            }
        }

        let mut roots = Vec::new();
        let mut root_shape = RecordShape::default();
        for slot in template.roots() {
            let Some(serializer) = spec.get(slot.name()) else {
                continue;
            };
            let node = PlanNode::compile(template, spec, slot, serializer)?;
            node.insert_field(&mut root_shape)?;
            roots.push(node);
        }
        Ok(Self {
            roots,
            schema: Schema { root: root_shape },
        })
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }

    /// Runs the plan over a graph view of the template it was compiled for.
    pub fn serialize(&self, view: &GraphView<'_>) -> Result<Json, SerializeError> {
        relgraph_profile_scope!("serialize", "data");
        relgraph_trace_serialize!(view.template().label(), "data", self.roots.len());
        let mut out = Map::new();
        for root in &self.roots {
            let value = root.aggregate(view.container(root.slot.id()))?;
            root.insert_value(&mut out, value)?;
        }
        Ok(Json::Object(out))
    }
}

impl<'a> PlanNode<'a> {
    fn compile(
        template: &'a GraphTemplate,
        spec: &SerializationSpec,
        slot: &'a Slot,
        serializer: &SlotSerializer,
    ) -> Result<Self, SerializeError> {
        let sub = match (slot.entity_kind().sub_template(), &serializer.sub) {
            (Some(nested), Some(sub_spec)) => Some(Box::new(SerializePlan::compile(nested, sub_spec)?)),
            (Some(nested), None) => Some(Box::new(SerializePlan::compile(
                nested,
                &SerializationSpec::all(nested),
            )?)),
            (None, Some(_)) => return Err(SerializeError::NotASubgraph(slot.name.clone())),
            (None, None) => None,
        };
        if sub.is_some() && matches!(serializer.aggregation, Aggregation::Fold { .. }) {
            return Err(SerializeError::FoldOnSubgraph(slot.name.clone()));
        }

        let mut children = Vec::new();
        for (pos, &child) in slot.children().iter().enumerate() {
            let child = template.at(child);
            if let Some(ser) = spec.get(child.name()) {
                children.push((pos, Self::compile(template, spec, child, ser)?));
            }
        }

        let mut node_shape = match (&serializer.shape, &sub) {
            (Some(shape), _) => shape.clone(),
            (None, _) if !serializer.each.is_empty() => Shape::Any,
            (None, Some(plan)) => Shape::Record(plan.schema().root.clone()),
            (None, None) => slot.transform().shape(slot.entity_kind()),
        };
        if !children.is_empty() {
            node_shape = attach_children(slot, node_shape, &children)?;
        }
        let nullable_node = node_shape.is_nullable();

        let shape = match &serializer.aggregation {
            Aggregation::All(_) => Shape::list(node_shape),
            Aggregation::Pick {
                default: Some(d), ..
            } if !d.is_null() => {
                if !node_shape.admits(d) {
                    return Err(SerializeError::DefaultMismatch(slot.name.clone()));
                }
                node_shape
            }
            Aggregation::Pick { .. } => Shape::nullable(node_shape),
            Aggregation::Fold { shape, .. } => shape.clone(),
        };

        let merged_keys = match &serializer.namer {
            Namer::Key(_) => Vec::new(),
            Namer::Merge(rename) => shape
                .as_record()
                .ok_or_else(|| SerializeError::NotMergeable(slot.name.clone()))?
                .keys()
                .map(|k| match rename {
                    Some(f) => CompactString::from(f(k)),
                    None => CompactString::from(k),
                })
                .collect(),
        };

        Ok(Self {
            slot,
            serializer: serializer.clone(),
            sub,
            children,
            nullable_node,
            shape,
            merged_keys,
        })
    }

    fn key(&self) -> &str {
        match &self.serializer.namer {
            Namer::Key(Some(key)) => key.as_str(),
            _ => self.slot.name(),
        }
    }

    fn doc(&self) -> Option<std::borrow::Cow<'static, str>> {
        self.serializer
            .doc
            .clone()
            .or_else(|| self.slot.doc.clone())
    }

    fn rename(&self, key: &str) -> CompactString {
        match &self.serializer.namer {
            Namer::Merge(Some(f)) => CompactString::from(f(key)),
            _ => CompactString::from(key),
        }
    }

    /// Adds this slot's output to the shape of the parent mapping.
    fn insert_field(&self, parent: &mut RecordShape) -> Result<(), SerializeError> {
        let mut fields = Vec::new();
        match self.shape.as_record() {
            Some(record) if self.serializer.is_merged() => {
                let nullable = self.shape.is_nullable();
                for (field, key) in record.fields.iter().zip(&self.merged_keys) {
                    fields.push(Field {
                        name: key.clone(),
                        shape: if nullable {
                            Shape::nullable(field.shape.clone())
                        } else {
                            field.shape.clone()
                        },
                        doc: field.doc.clone(),
                    });
                }
                parent.open |= record.open;
            }
            _ => fields.push(Field {
                name: self.key().into(),
                shape: self.shape.clone(),
                doc: self.doc(),
            }),
        }
        for field in fields {
            if parent.field(&field.name).is_some() {
                return Err(self.conflict(&field.name));
            }
            parent.fields.push(field);
        }
        Ok(())
    }

    /// Adds this slot's serialized value to the parent mapping.
    fn insert_value(&self, parent: &mut Map<String, Json>, value: Json) -> Result<(), SerializeError> {
        if !self.serializer.is_merged() {
            let key = self.key();
            if parent.contains_key(key) {
                return Err(self.conflict(key));
            }
            parent.insert(key.to_owned(), value);
            return Ok(());
        }
        match value {
            Json::Object(map) => {
                for (k, v) in map {
                    let key = self.rename(&k);
                    if parent.contains_key(key.as_str()) {
                        return Err(self.conflict(&key));
                    }
                    parent.insert(key.into_string(), v);
                }
                Ok(())
            }
            Json::Null => {
                for key in &self.merged_keys {
                    if parent.contains_key(key.as_str()) {
                        return Err(self.conflict(key));
                    }
                    parent.insert(key.to_string(), Json::Null);
                }
                Ok(())
            }
            _ => Err(SerializeError::NotMergeable(self.slot.name.clone())),
        }
    }

    fn conflict(&self, key: &str) -> SerializeError {
        SerializeError::MergeConflict {
            slot: self.slot.name.clone(),
            key: key.to_owned(),
        }
    }

    /// Reduces the nodes of a container into this slot's value.
    fn aggregate(&self, nodes: ContainerView<'_>) -> Result<Json, SerializeError> {
        match &self.serializer.aggregation {
            Aggregation::All(select) => {
                let mut items = Vec::with_capacity(nodes.len());
                for node in nodes.iter() {
                    if select.as_ref().is_none_or(|f| f(node.entity())) {
                        items.push(self.node(node)?);
                    }
                }
                Ok(Json::Array(items))
            }
            Aggregation::Pick { position, default } => {
                let picked = match *position {
                    Position::Head => nodes.first(),
                    Position::Last => nodes.last(),
                    Position::At(i) => nodes.get(i),
                };
                match picked {
                    Some(node) => self.node(node),
                    None => Ok(default.clone().unwrap_or(Json::Null)),
                }
            }
            Aggregation::Fold { f, .. } => {
                let entities: Vec<&Entity> = nodes.entities().collect();
                let transform = |e: &Entity| self.transform(e);
                f(entities.as_slice(), &transform).map_err(|source| SerializeError::ReducerError {
                    slot: self.slot.name.clone(),
                    source,
                })
            }
        }
    }

    /// Serializes one node and its emitted children.
    fn node(&self, node: NodeRef<'_>) -> Result<Json, SerializeError> {
        let entity = node.entity();
        let value = match (&self.sub, node.graph()) {
            (Some(plan), Some(nested)) => {
                let base = plan.serialize(&nested)?;
                self.each(entity, base)
            }
            _ => self.transform(entity),
        };
        let mut value = value.map_err(|source| SerializeError::TransformError {
            slot: self.slot.name.clone(),
            source,
        })?;
        if self.children.is_empty() {
            return Ok(value);
        }
        match &mut value {
            Json::Object(map) => {
                for (pos, child) in &self.children {
                    let child_value = child.aggregate(node.children_at(*pos))?;
                    child.insert_value(map, child_value)?;
                }
            }
            Json::Null if self.nullable_node => {}
            _ => return Err(SerializeError::NotAMapping(self.slot.name.clone())),
        }
        Ok(value)
    }

    fn transform(&self, entity: &Entity) -> Result<Json, BoxError> {
        let value = self.slot.transform().apply(entity)?;
        self.each(entity, value)
    }

    fn each(&self, entity: &Entity, mut value: Json) -> Result<Json, BoxError> {
        for step in &self.serializer.each {
            value = step(entity, value)?;
        }
        Ok(value)
    }
}

/// Extends a node shape with the fields of its emitted children.
///
/// Only record-shaped output can carry children; an unknown shape becomes an
/// open record of the children's keys.
fn attach_children(
    slot: &Slot,
    shape: Shape,
    children: &[(usize, PlanNode<'_>)],
) -> Result<Shape, SerializeError> {
    match shape {
        Shape::Record(mut record) => {
            for (_, child) in children {
                child.insert_field(&mut record)?;
            }
            Ok(Shape::Record(record))
        }
        Shape::Nullable(inner) if inner.as_record().is_some() => {
            Ok(Shape::nullable(attach_children(slot, *inner, children)?))
        }
        Shape::Any => {
            let mut record = RecordShape {
                fields: Vec::new(),
                open: true,
            };
            for (_, child) in children {
                child.insert_field(&mut record)?;
            }
            Ok(Shape::Record(record))
        }
        _ => Err(SerializeError::NotAMapping(slot.name.clone())),
    }
}
