//! Undo log for a single mutating call.

use relgraph_types::Entity;

use super::{Graph, NodeId};

#[derive(Debug)]
pub(crate) enum Change {
    Node(NodeId),
    Edge { parent: NodeId, child: NodeId },
    Replaced { node: NodeId, previous: Entity },
    /// Changes made to the nested graph of a sub-graph node
    Nested { node: NodeId, journal: Journal },
}

/// Changes applied by one append, replace or merge call, in order.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    changes: Vec<Change>,
    slots: usize,
    nodes: usize,
    edges: usize,
}

impl Journal {
    pub(crate) fn record(&mut self, change: Change) {
        match change {
            Change::Node(_) => self.nodes += 1,
            Change::Edge { .. } => self.edges += 1,
            Change::Replaced { .. } => {}
            Change::Nested { ref journal, .. } => {
                self.nodes += journal.nodes;
                self.edges += journal.edges;
            }
        }
        self.changes.push(change);
    }

    pub(crate) fn slot_supplied(&mut self) {
        self.slots += 1;
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn len(&self) -> usize {
        self.changes.len()
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn slots_supplied(&self) -> usize {
        self.slots
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn nodes_created(&self) -> usize {
        self.nodes
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn edges_added(&self) -> usize {
        self.edges
    }
}

impl Graph {
    /// Reverts every change of `journal`, newest first.
    ///
    /// Nodes and edge list entries are only ever pushed, so undoing in reverse
    /// order always pops the last element of each list.
    pub(crate) fn rollback(&mut self, journal: Journal) {
        let template = std::sync::Arc::clone(&self.template);
        for change in journal.changes.into_iter().rev() {
            match change {
                Change::Node(id) => {
                    let container = &mut self.containers[id.slot().index()];
                    let Some(node) = container.nodes.pop() else {
                        continue;
                    };
                    if let Some(key) = node.key {
                        if let Some(indices) = container.keys.get_mut(&key) {
                            indices.pop();
                            if indices.is_empty() {
                                container.keys.remove(&key);
                            }
                        }
                    }
                }
                Change::Edge { parent, child } => {
                    self.edges.remove(&(parent, child));
                    let parent_slot = template.at(parent.slot());
                    let child_slot = template.at(child.slot());
                    if let Some(pos) = parent_slot.child_position(child.slot()) {
                        self.containers[parent.slot().index()].nodes[parent.index()].children[pos]
                            .pop();
                    }
                    if let Some(pos) = child_slot.parent_position(parent.slot()) {
                        self.containers[child.slot().index()].nodes[child.index()].parents[pos]
                            .pop();
                    }
                }
                Change::Replaced { node, previous } => {
                    self.containers[node.slot().index()].nodes[node.index()].entity = previous;
                }
                Change::Nested { node, journal } => {
                    if let Some(sub) = self.containers[node.slot().index()].nodes[node.index()]
                        .sub
                        .as_deref_mut()
                    {
                        sub.rollback(journal);
                    }
                }
            }
        }
    }
}
