//! Serialization of graphs into nested values
//!
//! A [`SerializationSpec`] maps slot names to [`SlotSerializer`]s. Only slots
//! with an entry are emitted; root slots without an entry are left out of the
//! result, which is how a subset of roots is selected.
//!
//! Both entry points compile the same [`SerializePlan`]: [`serialize`] walks it
//! over a graph view and [`schema`] returns its static [`Schema`], so the two
//! always agree on keys, nesting and list-vs-single classification.
//!
//! ```
//! use relgraph_core::{row, serialize, Graph, GraphTemplate, SerializationSpec, SlotSerializer};
//! use relgraph_types::{record, AttributeDef, EntityType, ScalarType, Value};
//! use serde_json::json;
//!
//! const BLOG: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//! let blog = EntityType::from_defs("blog", BLOG).unwrap();
//!
//! let mut builder = GraphTemplate::builder();
//! builder.declare("blog", &blog).unwrap();
//! builder.declare("tag", ScalarType::Text).unwrap();
//! builder.relate("blog", ["tag"]).unwrap();
//! let template = builder.build();
//!
//! let mut graph = Graph::new(template);
//! graph
//!     .append(row! {
//!         "blog" => record!(blog, { "id" => 1, "title" => "A" }).unwrap(),
//!         "tag" => vec![Value::from("rust"), Value::from("db")],
//!     })
//!     .unwrap();
//!
//! let spec = SerializationSpec::new()
//!     .with("blog", SlotSerializer::new().name("blogs"))
//!     .with("tag", SlotSerializer::new().name("tags"));
//! let out = serialize::serialize(&graph.view(), &spec).unwrap();
//! assert_eq!(out, json!({ "blogs": [{ "id": 1, "title": "A", "tags": ["rust", "db"] }] }));
//! ```

mod plan;
mod shape;
mod transform;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use relgraph_types::Entity;
use serde_json::Value as Json;

pub use plan::SerializePlan;
pub use shape::{Field, RecordShape, Schema, Shape};
pub use transform::{Transform, TransformFn, record_to_json, value_to_json};

use crate::error::{BoxError, SerializeError};
use crate::graph::GraphView;
use crate::relgraph_trace_serialize;
use crate::template::GraphTemplate;

/// Step of a slot's transform chain: receives the entity and the output of
/// the previous step.
pub type EachFn = Arc<dyn Fn(&Entity, Json) -> Result<Json, BoxError> + Send + Sync>;

/// Node filter of list aggregation.
pub type SelectFn = Arc<dyn Fn(&Entity) -> bool + Send + Sync>;

/// Custom reducer: raw entities in order, plus the slot's transform chain.
pub type FoldFn = Arc<
    dyn Fn(&[&Entity], &dyn Fn(&Entity) -> Result<Json, BoxError>) -> Result<Json, BoxError>
        + Send
        + Sync,
>;

/// Renames keys spliced into the parent by a merged slot.
pub type RenameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Namer {
    Key(Option<CompactString>),
    Merge(Option<RenameFn>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Head,
    Last,
    At(usize),
}

#[derive(Clone)]
pub(crate) enum Aggregation {
    All(Option<SelectFn>),
    Pick {
        position: Position,
        default: Option<Json>,
    },
    Fold {
        f: FoldFn,
        shape: Shape,
    },
}

/// How one slot is serialized: naming, aggregation, transforms, documentation.
#[derive(Clone)]
pub struct SlotSerializer {
    pub(crate) namer: Namer,
    pub(crate) aggregation: Aggregation,
    pub(crate) each: Vec<EachFn>,
    pub(crate) shape: Option<Shape>,
    pub(crate) sub: Option<Arc<SerializationSpec>>,
    pub(crate) doc: Option<Cow<'static, str>>,
}

impl Default for SlotSerializer {
    fn default() -> Self {
        Self {
            namer: Namer::Key(None),
            aggregation: Aggregation::All(None),
            each: Vec::new(),
            shape: None,
            sub: None,
            doc: None,
        }
    }
}

impl SlotSerializer {
    /// Slot name as key, list of every node, base transform only.
    pub fn new() -> Self {
        Self::default()
    }

    // Naming

    /// Output key instead of the slot name.
    #[must_use]
    pub fn name(mut self, key: impl Into<CompactString>) -> Self {
        self.namer = Namer::Key(Some(key.into()));
        self
    }

    /// Splice the serialized record into the parent mapping.
    #[must_use]
    pub fn merge(mut self) -> Self {
        self.namer = Namer::Merge(None);
        self
    }

    /// Like [`SlotSerializer::merge`], renaming each spliced key.
    #[must_use]
    pub fn merge_with<F>(mut self, rename: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.namer = Namer::Merge(Some(Arc::new(rename)));
        self
    }

    // Aggregation

    /// A list of every node. The default.
    #[must_use]
    pub fn all(mut self) -> Self {
        self.aggregation = Aggregation::All(None);
        self
    }

    /// A list of the nodes whose entity satisfies `f`.
    #[must_use]
    pub fn select<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entity) -> bool + Send + Sync + 'static,
    {
        self.aggregation = Aggregation::All(Some(Arc::new(f)));
        self
    }

    /// The first node, or `null`.
    #[must_use]
    pub fn head(self) -> Self {
        self.pick(Position::Head, None)
    }

    /// Alias of [`SlotSerializer::head`].
    #[must_use]
    pub fn first(self) -> Self {
        self.head()
    }

    /// The last node, or `null`.
    #[must_use]
    pub fn last(self) -> Self {
        self.pick(Position::Last, None)
    }

    /// The node at `index`, or `null`.
    #[must_use]
    pub fn at(self, index: usize) -> Self {
        self.pick(Position::At(index), None)
    }

    /// The first node, or `default`.
    #[must_use]
    pub fn head_or(self, default: Json) -> Self {
        self.pick(Position::Head, Some(default))
    }

    /// The last node, or `default`.
    #[must_use]
    pub fn last_or(self, default: Json) -> Self {
        self.pick(Position::Last, Some(default))
    }

    /// The node at `index`, or `default`.
    #[must_use]
    pub fn at_or(self, index: usize, default: Json) -> Self {
        self.pick(Position::At(index), Some(default))
    }

    fn pick(mut self, position: Position, default: Option<Json>) -> Self {
        self.aggregation = Aggregation::Pick { position, default };
        self
    }

    /// Custom reducer over the raw entities of the slot. Its result is used
    /// as-is, so the output shape must be declared.
    #[must_use]
    pub fn fold<F>(mut self, shape: Shape, f: F) -> Self
    where
        F: Fn(&[&Entity], &dyn Fn(&Entity) -> Result<Json, BoxError>) -> Result<Json, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.aggregation = Aggregation::Fold {
            f: Arc::new(f),
            shape,
        };
        self
    }

    // Transform

    /// Appends a step to the transform chain.
    ///
    /// The output shape becomes unknown unless declared with
    /// [`SlotSerializer::shaped`].
    #[must_use]
    pub fn each<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entity, Json) -> Result<Json, BoxError> + Send + Sync + 'static,
    {
        self.each.push(Arc::new(f));
        self
    }

    /// Serializes the nested graph of each node of a sub-graph slot with
    /// `spec`, picking the first node.
    ///
    /// Sub-graph slots serialized without this use every slot of the nested
    /// template and keep their aggregation.
    #[must_use]
    pub fn sub(mut self, spec: SerializationSpec) -> Self {
        self.sub = Some(Arc::new(spec));
        self.head()
    }

    /// Declares the shape of each node's output.
    #[must_use]
    pub fn shaped(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn is_merged(&self) -> bool {
        matches!(self.namer, Namer::Merge(_))
    }
}

impl fmt::Debug for SlotSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namer = match &self.namer {
            Namer::Key(Some(k)) => format!("key({k})"),
            Namer::Key(None) => "slot name".to_owned(),
            Namer::Merge(_) => "merge".to_owned(),
        };
        let aggregation = match &self.aggregation {
            Aggregation::All(None) => "all".to_owned(),
            Aggregation::All(Some(_)) => "select".to_owned(),
            Aggregation::Pick { position, .. } => format!("{position:?}"),
            Aggregation::Fold { .. } => "fold".to_owned(),
        };
        f.debug_struct("SlotSerializer")
            .field("namer", &namer)
            .field("aggregation", &aggregation)
            .field("each", &self.each.len())
            .field("shape", &self.shape)
            .field("sub", &self.sub)
            .field("doc", &self.doc)
            .finish()
    }
}

/// Ordered slot name → serializer map.
#[derive(Debug, Clone, Default)]
pub struct SerializationSpec {
    entries: Vec<(CompactString, SlotSerializer)>,
}

impl SerializationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default serializers for every slot of `template`. Sub-graph slots
    /// serialize their first nested graph the same way.
    pub fn all(template: &GraphTemplate) -> Self {
        let mut spec = Self::new();
        for slot in template.slots() {
            let serializer = match slot.entity_kind().sub_template() {
                Some(nested) => SlotSerializer::new().sub(Self::all(nested)),
                None => SlotSerializer::new(),
            };
            spec.insert(slot.name(), serializer);
        }
        spec
    }

    /// Sets the serializer of a slot, replacing any previous one.
    pub fn insert(&mut self, slot: &str, serializer: SlotSerializer) -> &mut Self {
        match self.entries.iter_mut().find(|(name, _)| name == slot) {
            Some((_, existing)) => *existing = serializer,
            None => self.entries.push((slot.into(), serializer)),
        }
        self
    }

    #[must_use]
    pub fn with(mut self, slot: &str, serializer: SlotSerializer) -> Self {
        self.insert(slot, serializer);
        self
    }

    pub fn get(&self, slot: &str) -> Option<&SlotSerializer> {
        self.entries.iter().find(|(name, _)| name == slot).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SlotSerializer)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializes a graph view into a JSON object keyed by root output keys.
pub fn serialize(view: &GraphView<'_>, spec: &SerializationSpec) -> Result<Json, SerializeError> {
    SerializePlan::compile(view.template(), spec)?.serialize(view)
}

/// Computes the shape [`serialize`] produces for any graph of `template`.
pub fn schema(template: &GraphTemplate, spec: &SerializationSpec) -> Result<Schema, SerializeError> {
    let plan = SerializePlan::compile(template, spec)?;
    relgraph_trace_serialize!(template.label(), "schema", plan.schema().root.fields.len());
    Ok(plan.into_schema())
}
