//! Graph instances
//!
//! A [`Graph`] is bound to a [`GraphTemplate`] and grows through
//! [`Graph::append`]: each call folds one flat result row into the graph,
//! reusing nodes whose entities are identical under the slot's identity
//! policy within the resolved parent scope.
//!
//! ```
//! use relgraph_core::{row, Graph, GraphTemplate};
//! use relgraph_types::{record, AttributeDef, EntityType, ScalarType};
//!
//! const BLOG: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//! const POST: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//! let blog = EntityType::from_defs("blog", BLOG).unwrap();
//! let post = EntityType::from_defs("post", POST).unwrap();
//!
//! let mut builder = GraphTemplate::builder();
//! builder.declare("blog", &blog).unwrap();
//! builder.declare("post", &post).unwrap();
//! builder.relate("blog", ["post"]).unwrap();
//! let template = builder.build();
//!
//! let mut graph = Graph::new(template);
//! graph
//!     .append(row! {
//!         "blog" => record!(blog, { "id" => 1, "title" => "A" }).unwrap(),
//!         "post" => record!(post, { "id" => 10, "title" => "P1" }).unwrap(),
//!     })
//!     .unwrap()
//!     .append(row! {
//!         "blog" => record!(blog, { "id" => 1 }).unwrap(),
//!         "post" => record!(post, { "id" => 11, "title" => "P2" }).unwrap(),
//!     })
//!     .unwrap();
//!
//! assert_eq!(graph.len("blog").unwrap(), 1);
//! assert_eq!(graph.len("post").unwrap(), 2);
//! assert_eq!(graph.edge_count(), 2);
//! ```

mod append;
mod journal;
mod view;

use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use relgraph_types::{Entity, Record, Value};
use smallvec::SmallVec;

pub use view::{ContainerView, GraphView, NodeRef};

use crate::error::{AppendError, ViewError};
use crate::identity::IdentityKey;
use crate::template::{GraphTemplate, SlotId};

/// Stable identity of a node: its slot and insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    slot: SlotId,
    index: u32,
}

impl NodeId {
    #[inline]
    pub(crate) const fn new(slot: SlotId, index: u32) -> Self {
        Self { slot, index }
    }

    #[inline]
    pub const fn slot(self) -> SlotId {
        self.slot
    }

    /// Insertion index within the slot.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// `Null` for nodes of sub-graph slots
    pub(crate) entity: Entity,
    pub(crate) sub: Option<Box<Graph>>,
    pub(crate) key: Option<IdentityKey>,
    /// Child node indices per position in the slot's declared children
    pub(crate) children: Vec<Vec<u32>>,
    /// Parent node indices per position in the slot's declared parents
    pub(crate) parents: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Container {
    pub(crate) nodes: Vec<Node>,
    pub(crate) keys: HashMap<IdentityKey, SmallVec<[u32; 1]>>,
}

impl Container {
    pub(crate) fn matches(&self, key: Option<&IdentityKey>) -> &[u32] {
        key.and_then(|k| self.keys.get(k))
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }
}

/// Mutable set of nodes and edges bound to a template.
///
/// Calls are not synchronized; a graph is meant to be filled from one thread
/// and then read through [`Graph::view`].
#[derive(Debug, Clone)]
pub struct Graph {
    template: Arc<GraphTemplate>,
    containers: Vec<Container>,
    edges: HashSet<(NodeId, NodeId)>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(template: Arc<GraphTemplate>) -> Self {
        let containers = vec![Container::default(); template.len()];
        Self {
            template,
            containers,
            edges: HashSet::new(),
        }
    }

    /// Creates a graph and merges every base into it, in order.
    pub fn from_bases(
        template: Arc<GraphTemplate>,
        bases: &[GraphView<'_>],
    ) -> Result<Self, AppendError> {
        let mut graph = Self::new(template);
        for base in bases {
            graph.merge(base)?;
        }
        Ok(graph)
    }

    #[inline]
    pub fn template(&self) -> &Arc<GraphTemplate> {
        &self.template
    }

    /// Read-only view. The graph cannot change while the view is alive.
    #[inline]
    pub fn view(&self) -> GraphView<'_> {
        GraphView::new(self)
    }

    /// Number of nodes of a slot.
    pub fn len(&self, slot: &str) -> Result<usize, ViewError> {
        let slot = self
            .template
            .get(slot)
            .ok_or_else(|| ViewError::UnknownSlot(slot.into()))?;
        Ok(self.containers[slot.id().index()].nodes.len())
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.containers.iter().map(|c| c.nodes.len()).sum()
    }

    /// Number of distinct parent → child edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if no node was ever appended.
    pub fn is_empty(&self) -> bool {
        self.containers.iter().all(|c| c.nodes.is_empty())
    }

    #[inline]
    pub(crate) fn container(&self, slot: SlotId) -> &Container {
        &self.containers[slot.index()]
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.containers[id.slot.index()].nodes[id.index()]
    }
}

/// Values supplied for one slot in one append call.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// A single entity
    One(Entity),
    /// Sibling entities sharing the same parent scope
    Many(Vec<Entity>),
    /// A row appended to the nested graphs of a sub-graph slot
    Row(Vec<(CompactString, SlotValue)>),
    /// Nothing for this row
    Absent,
}

impl SlotValue {
    /// A nested row for a sub-graph slot.
    pub fn row<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SlotValue>,
    {
        SlotValue::Row(
            values
                .into_iter()
                .map(|(k, v)| (CompactString::from(k.as_ref()), v.into()))
                .collect(),
        )
    }

    /// Supplied entities without absent scalars. Empty for nested rows.
    pub(crate) fn into_entities(self) -> Vec<Entity> {
        let mut entities = match self {
            SlotValue::One(e) => vec![e],
            SlotValue::Many(v) => v,
            SlotValue::Row(_) | SlotValue::Absent => Vec::new(),
        };
        entities.retain(|e| !e.is_absent());
        entities
    }
}

impl From<Entity> for SlotValue {
    fn from(e: Entity) -> Self {
        SlotValue::One(e)
    }
}

impl From<Record> for SlotValue {
    fn from(r: Record) -> Self {
        SlotValue::One(Entity::Record(r))
    }
}

impl From<Value> for SlotValue {
    fn from(v: Value) -> Self {
        SlotValue::One(Entity::Scalar(v))
    }
}

impl From<Vec<Entity>> for SlotValue {
    fn from(v: Vec<Entity>) -> Self {
        SlotValue::Many(v)
    }
}

impl From<Vec<Record>> for SlotValue {
    fn from(v: Vec<Record>) -> Self {
        SlotValue::Many(v.into_iter().map(Entity::Record).collect())
    }
}

impl From<Vec<Value>> for SlotValue {
    fn from(v: Vec<Value>) -> Self {
        SlotValue::Many(v.into_iter().map(Entity::Scalar).collect())
    }
}

impl<'a, const N: usize> From<[(&'a str, SlotValue); N]> for SlotValue {
    fn from(values: [(&'a str, SlotValue); N]) -> Self {
        SlotValue::row(values)
    }
}

impl<'a> From<Vec<(&'a str, SlotValue)>> for SlotValue {
    fn from(values: Vec<(&'a str, SlotValue)>) -> Self {
        SlotValue::row(values)
    }
}

impl<T: Into<SlotValue>> From<Option<T>> for SlotValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SlotValue::Absent, Into::into)
    }
}

macro_rules! impl_slot_value_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SlotValue {
                #[inline]
                fn from(v: $t) -> Self {
                    SlotValue::One(Entity::from(v))
                }
            }
        )*
    };
}

impl_slot_value_from_scalar!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String);

/// Builds one append row from `slot => value` pairs.
///
/// Values are converted with [`SlotValue::from`], so records, scalars,
/// vectors and `Option`s may be mixed.
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<(&str, $crate::SlotValue)>::new()
    };
    ($($slot:expr => $value:expr),+ $(,)?) => {
        [$(($slot, $crate::SlotValue::from($value))),+]
    };
}
