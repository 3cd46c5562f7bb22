//! Read-only navigation over a graph.

use std::fmt;

use relgraph_types::Entity;

use super::{Graph, NodeId};
use crate::error::ViewError;
use crate::template::{GraphTemplate, Slot, SlotId};

/// Read-only view of a [`Graph`].
///
/// A view borrows its graph, so the graph cannot be appended to while any
/// view, container or node obtained from it is alive.
#[derive(Clone, Copy)]
pub struct GraphView<'g> {
    graph: &'g Graph,
}

impl<'g> GraphView<'g> {
    pub(crate) fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    #[inline]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    #[inline]
    pub fn template(&self) -> &'g GraphTemplate {
        self.graph.template()
    }

    /// Every node of a slot, in insertion order.
    pub fn nodes(&self, slot: &str) -> Result<ContainerView<'g>, ViewError> {
        let slot = self
            .template()
            .get(slot)
            .ok_or_else(|| ViewError::UnknownSlot(slot.into()))?;
        Ok(self.container(slot.id()))
    }

    /// Containers of the root slots, in topological order.
    pub fn roots(&self) -> impl Iterator<Item = ContainerView<'g>> + use<'g> {
        let view = *self;
        view.template().roots().map(move |s| view.container(s.id()))
    }

    /// Looks a node up by id.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'g>> {
        self.graph
            .containers
            .get(id.slot().index())
            .and_then(|c| c.nodes.get(id.index()))
            .map(|_| NodeRef {
                graph: self.graph,
                id,
            })
    }

    pub(crate) fn container(&self, slot: SlotId) -> ContainerView<'g> {
        ContainerView {
            graph: self.graph,
            slot,
            members: Members::All(self.graph.container(slot).nodes.len()),
        }
    }
}

impl fmt::Debug for GraphView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for slot in self.template().slots() {
            map.entry(&slot.name(), &self.graph.container(slot.id()).nodes.len());
        }
        map.finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Members<'g> {
    All(usize),
    Listed(&'g [u32]),
}

/// Ordered nodes of one slot: all of them, or the children or parents of a
/// node.
#[derive(Clone, Copy)]
pub struct ContainerView<'g> {
    graph: &'g Graph,
    slot: SlotId,
    members: Members<'g>,
}

impl<'g> ContainerView<'g> {
    #[inline]
    pub fn slot(&self) -> &'g Slot {
        self.graph.template().at(self.slot)
    }

    #[inline]
    pub fn slot_name(&self) -> &'g str {
        self.slot().name()
    }

    pub fn len(&self) -> usize {
        match self.members {
            Members::All(n) => n,
            Members::Listed(ix) => ix.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<NodeRef<'g>> {
        let index = match self.members {
            Members::All(n) => (i < n).then_some(i as u32)?,
            Members::Listed(ix) => *ix.get(i)?,
        };
        Some(NodeRef {
            graph: self.graph,
            id: NodeId::new(self.slot, index),
        })
    }

    pub fn first(&self) -> Option<NodeRef<'g>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<NodeRef<'g>> {
        self.len().checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'g>> + use<'g> {
        let this = *self;
        (0..this.len()).filter_map(move |i| this.get(i))
    }

    /// Entities in order.
    pub fn entities(&self) -> impl Iterator<Item = &'g Entity> + use<'g> {
        self.iter().map(|n| n.entity())
    }
}

impl<'g> IntoIterator for ContainerView<'g> {
    type Item = NodeRef<'g>;
    type IntoIter = Box<dyn Iterator<Item = NodeRef<'g>> + 'g>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl fmt::Debug for ContainerView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entities()).finish()
    }
}

/// A node of a viewed graph.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The entity stored in the node. `Null` for nodes of sub-graph slots.
    #[inline]
    pub fn entity(&self) -> &'g Entity {
        &self.graph.node(self.id).entity
    }

    /// The nested graph of a sub-graph slot node.
    pub fn graph(&self) -> Option<GraphView<'g>> {
        self.graph.node(self.id).sub.as_deref().map(GraphView::new)
    }

    #[inline]
    pub fn slot(&self) -> &'g Slot {
        self.graph.template().at(self.id.slot())
    }

    #[inline]
    pub fn slot_name(&self) -> &'g str {
        self.slot().name()
    }

    /// Children of this node in slot `name`, in first-insertion order.
    pub fn children(&self, name: &str) -> Result<ContainerView<'g>, ViewError> {
        let related = self.related(name)?;
        let pos = self
            .slot()
            .child_position(related)
            .ok_or_else(|| self.not_related(name))?;
        Ok(self.children_at(pos))
    }

    /// Parents of this node in slot `name`, in first-insertion order.
    pub fn parents(&self, name: &str) -> Result<ContainerView<'g>, ViewError> {
        let related = self.related(name)?;
        let pos = self
            .slot()
            .parent_position(related)
            .ok_or_else(|| self.not_related(name))?;
        Ok(ContainerView {
            graph: self.graph,
            slot: related,
            members: Members::Listed(&self.graph.node(self.id).parents[pos]),
        })
    }

    /// First child in slot `name`, if any.
    pub fn child(&self, name: &str) -> Result<Option<NodeRef<'g>>, ViewError> {
        Ok(self.children(name)?.first())
    }

    /// Children at a position of the slot's declared children.
    pub(crate) fn children_at(&self, pos: usize) -> ContainerView<'g> {
        ContainerView {
            graph: self.graph,
            slot: self.slot().children()[pos],
            members: Members::Listed(&self.graph.node(self.id).children[pos]),
        }
    }

    fn related(&self, name: &str) -> Result<SlotId, ViewError> {
        self.graph
            .template()
            .get(name)
            .map(Slot::id)
            .ok_or_else(|| ViewError::UnknownSlot(name.into()))
    }

    fn not_related(&self, name: &str) -> ViewError {
        ViewError::NotRelated {
            slot: self.slot_name().into(),
            related: name.into(),
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("slot", &self.slot_name())
            .field("index", &self.id.index())
            .field("entity", self.entity())
            .finish()
    }
}
