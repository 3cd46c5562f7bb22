//! Graph templates
//!
//! A [`GraphTemplate`] declares the node kinds (slots) of a graph and the
//! parent → child relations between them. Templates are immutable once built
//! and shared as `Arc<GraphTemplate>` by any number of graphs.
//!
//! ```
//! use relgraph_core::{GraphTemplate, SlotDecl};
//! use relgraph_types::{AttributeDef, EntityType, ScalarType};
//!
//! const BLOG: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//! let blog = EntityType::from_defs("blog", BLOG).unwrap();
//!
//! let mut builder = GraphTemplate::builder();
//! builder
//!     .declare("blog", &blog).unwrap()
//!     .declare("tag", SlotDecl::scalar(ScalarType::Text)).unwrap()
//!     .relate("blog", ["tag"]).unwrap();
//! let template = builder.build();
//!
//! assert_eq!(template.children("blog").unwrap(), ["tag"]);
//! assert!(template.slot("tag").unwrap().parents().len() == 1);
//! ```

mod builder;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;
use relgraph_types::{Entity, EntityType, ScalarType};

pub use builder::{SlotDecl, TemplateBuilder};

use crate::error::TemplateError;
use crate::identity::{IdentityPolicy, SharedPolicy};
use crate::serialize::Transform;
use crate::spec::GraphSpec;

/// Predicate deciding whether an entity is appended at all.
pub type EntityFilter = Arc<dyn Fn(&Entity) -> bool + Send + Sync>;

/// Position of a slot in its template's declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a slot holds.
#[derive(Debug, Clone)]
pub enum SlotKind {
    /// Records of one entity type
    Record(Arc<EntityType>),
    /// Scalars of one type
    Scalar(ScalarType),
    /// Anything
    Untyped,
    /// A nested graph per node, filled from nested rows
    Graph(Arc<GraphTemplate>),
}

impl PartialEq for SlotKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SlotKind::Record(a), SlotKind::Record(b)) => a == b,
            (SlotKind::Scalar(a), SlotKind::Scalar(b)) => a == b,
            (SlotKind::Untyped, SlotKind::Untyped) => true,
            (SlotKind::Graph(a), SlotKind::Graph(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl SlotKind {
    /// Returns `true` if `entity` may be stored in a slot of this kind.
    ///
    /// Sub-graph slots accept no entity; they take nested rows.
    pub fn accepts(&self, entity: &Entity) -> bool {
        match (self, entity) {
            (SlotKind::Untyped, _) => true,
            (SlotKind::Record(ty), Entity::Record(r)) => {
                Arc::ptr_eq(ty, r.entity_type()) || **ty == **r.entity_type()
            }
            (SlotKind::Scalar(t), Entity::Scalar(v)) => t.accepts(v),
            _ => false,
        }
    }

    /// The entity type of record slots.
    pub fn entity_type(&self) -> Option<&Arc<EntityType>> {
        match self {
            SlotKind::Record(ty) => Some(ty),
            _ => None,
        }
    }

    /// Template of the nested graphs of sub-graph slots.
    pub fn sub_template(&self) -> Option<&Arc<GraphTemplate>> {
        match self {
            SlotKind::Graph(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, SlotKind::Record(_))
    }

    #[inline]
    pub fn is_graph(&self) -> bool {
        matches!(self, SlotKind::Graph(_))
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Record(ty) => write!(f, "record '{}'", ty.name()),
            SlotKind::Scalar(t) => write!(f, "{t} scalar"),
            SlotKind::Untyped => f.write_str("any value"),
            SlotKind::Graph(t) => write!(f, "sub-graph of {} slots", t.len()),
        }
    }
}

/// A named node kind of a template.
#[derive(Clone)]
pub struct Slot {
    pub(crate) id: SlotId,
    pub(crate) name: CompactString,
    pub(crate) kind: SlotKind,
    pub(crate) identity: SharedPolicy,
    pub(crate) filter: Option<EntityFilter>,
    pub(crate) transform: Transform,
    pub(crate) doc: Option<Cow<'static, str>>,
    pub(crate) parents: Vec<SlotId>,
    pub(crate) children: Vec<SlotId>,
}

impl Slot {
    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared entity kind.
    #[inline]
    pub fn entity_kind(&self) -> &SlotKind {
        &self.kind
    }

    /// Identity policy used to deduplicate nodes of this slot.
    #[inline]
    pub fn identity(&self) -> &dyn IdentityPolicy {
        self.identity.as_ref()
    }

    /// Entity filter applied on append, if any.
    #[inline]
    pub fn filter(&self) -> Option<&EntityFilter> {
        self.filter.as_ref()
    }

    /// Base serialization transform.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Declared parent slots, in relation order.
    #[inline]
    pub fn parents(&self) -> &[SlotId] {
        &self.parents
    }

    /// Declared child slots, in relation order.
    #[inline]
    pub fn children(&self) -> &[SlotId] {
        &self.children
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub(crate) fn accepts(&self, entity: &Entity) -> bool {
        self.filter.as_ref().is_none_or(|f| f(entity))
    }

    pub(crate) fn child_position(&self, child: SlotId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub(crate) fn parent_position(&self, parent: SlotId) -> Option<usize> {
        self.parents.iter().position(|&p| p == parent)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("identity", &self.identity.name())
            .field("filter", &self.filter.is_some())
            .field("transform", &self.transform)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish()
    }
}

/// Immutable declaration of slots and their relations.
#[derive(Debug, Clone)]
pub struct GraphTemplate {
    label: CompactString,
    slots: Vec<Slot>,
    index: HashMap<CompactString, SlotId>,
    order: Vec<SlotId>,
}

impl GraphTemplate {
    /// Starts a template using the default [`GraphSpec`].
    pub fn builder() -> TemplateBuilder<'static> {
        GraphSpec::global().new_template()
    }

    pub(crate) fn from_parts(
        label: CompactString,
        slots: Vec<Slot>,
        index: HashMap<CompactString, SlotId>,
    ) -> Self {
        let order = topological_order(&slots);
        Self {
            label,
            slots,
            index,
            order,
        }
    }

    /// Configuration name of the spec the template was built with.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks a slot up by name.
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.index.get(name).map(|&id| &self.slots[id.index()])
    }

    /// Looks a slot up by name, failing with `UnknownSlot`.
    pub fn slot(&self, name: &str) -> Result<&Slot, TemplateError> {
        self.get(name)
            .ok_or_else(|| TemplateError::UnknownSlot(name.into()))
    }

    /// Looks a slot up by id.
    pub fn by_id(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    /// Slots in topological order: parents before children, otherwise in
    /// declaration order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.order.iter().map(|id| &self.slots[id.index()])
    }

    /// Slots without declared parents, in topological order.
    pub fn roots(&self) -> impl Iterator<Item = &Slot> {
        self.slots().filter(|s| s.is_root())
    }

    /// Names of the declared parents of a slot.
    pub fn parents(&self, name: &str) -> Result<Vec<&str>, TemplateError> {
        let slot = self.slot(name)?;
        Ok(self.names(&slot.parents))
    }

    /// Names of the declared children of a slot.
    pub fn children(&self, name: &str) -> Result<Vec<&str>, TemplateError> {
        let slot = self.slot(name)?;
        Ok(self.names(&slot.children))
    }

    fn names(&self, ids: &[SlotId]) -> Vec<&str> {
        ids.iter().map(|id| self.slots[id.index()].name()).collect()
    }

    /// Slot by id, for ids handed out by this template.
    #[inline]
    pub(crate) fn at(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub(crate) fn slots_by_id(&self) -> &[Slot] {
        &self.slots
    }
}

fn topological_order(slots: &[Slot]) -> Vec<SlotId> {
    let mut placed = vec![false; slots.len()];
    let mut order = Vec::with_capacity(slots.len());
    while let Some(next) = slots
        .iter()
        .find(|s| !placed[s.id.index()] && s.parents.iter().all(|p| placed[p.index()]))
    {
        placed[next.id.index()] = true;
        order.push(next.id);
    }
    order
}
