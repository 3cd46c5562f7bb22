//! Append, replace and merge.

use std::sync::Arc;

use hashbrown::HashMap;
use relgraph_types::{Entity, Record, Value};
use smallvec::SmallVec;

use super::journal::{Change, Journal};
use super::{Graph, GraphView, Node, NodeId, SlotValue};
use crate::error::AppendError;
use crate::identity::IdentityKey;
use crate::template::{GraphTemplate, Slot, SlotId, SlotKind};
use crate::{relgraph_profile_function, relgraph_trace_append, relgraph_trace_rollback};

type Resolved = SmallVec<[u32; 2]>;

/// One row, indexed by slot id.
type PreparedRow = Vec<Option<Supplied>>;

/// Values of one slot for one row.
#[derive(Debug, Clone)]
enum Supplied {
    Entities(Vec<Entity>),
    Row(PreparedRow),
}

/// Outcome of a slot for the current row, read by its children.
#[derive(Debug, Clone)]
enum Scope {
    NotSupplied,
    Rejected,
    Resolved(Resolved),
}

impl Graph {
    /// Folds one row into the graph.
    ///
    /// Slots are processed parents first. Within the scope of the parent
    /// nodes resolved for the same row, an identical existing node is reused
    /// and a new node is created otherwise. A record carrying only its primary
    /// key addresses an existing node and never creates one.
    ///
    /// A sub-graph slot takes a nested row ([`SlotValue::Row`]), appended to
    /// the nested graph held under each resolved parent node.
    ///
    /// On error the graph is left exactly as it was before the call.
    pub fn append<I, K, V>(&mut self, values: I) -> Result<&mut Self, AppendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SlotValue>,
    {
        self.apply(values, false)
    }

    /// Like [`Graph::append`], but reused nodes take the incoming entity.
    ///
    /// Key-only references never overwrite.
    pub fn replace<I, K, V>(&mut self, values: I) -> Result<&mut Self, AppendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SlotValue>,
    {
        self.apply(values, true)
    }

    /// Folds every node of another graph into this one.
    ///
    /// Slots are matched by name. Nodes are visited parents first and resolved
    /// with the same identity rules as [`Graph::append`]. The call is atomic.
    pub fn merge(&mut self, other: &GraphView<'_>) -> Result<&mut Self, AppendError> {
        relgraph_profile_function!();
        let mut journal = Journal::default();
        match self.merge_nodes(other, &mut journal) {
            Ok(()) => {
                relgraph_trace_append!(
                    self.template.label(),
                    "merge",
                    other.template().len(),
                    journal.nodes_created(),
                    journal.edges_added()
                );
                Ok(self)
            }
            Err(err) => {
                relgraph_trace_rollback!(self.template.label(), "merge", err, journal.len());
                self.rollback(journal);
                Err(err)
            }
        }
    }

    fn apply<I, K, V>(&mut self, values: I, replace: bool) -> Result<&mut Self, AppendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SlotValue>,
    {
        relgraph_profile_function!();
        let row = prepare(&self.template, values)?;
        let mut journal = Journal::default();
        match self.apply_row(row, replace, &mut journal) {
            Ok(()) => {
                relgraph_trace_append!(
                    self.template.label(),
                    if replace { "replace" } else { "append" },
                    journal.slots_supplied(),
                    journal.nodes_created(),
                    journal.edges_added()
                );
                Ok(self)
            }
            Err(err) => {
                relgraph_trace_rollback!(
                    self.template.label(),
                    if replace { "replace" } else { "append" },
                    err,
                    journal.len()
                );
                self.rollback(journal);
                Err(err)
            }
        }
    }

    fn apply_row(
        &mut self,
        mut row: PreparedRow,
        replace: bool,
        journal: &mut Journal,
    ) -> Result<(), AppendError> {
        let template = Arc::clone(&self.template);
        let mut scopes = vec![Scope::NotSupplied; template.len()];

        for slot in template.slots() {
            let Some(supplied) = row[slot.id().index()].take() else {
                continue;
            };
            journal.slot_supplied();

            let mut candidates: SmallVec<[NodeId; 4]> = SmallVec::new();
            let mut parent_rejected = false;
            for &parent in slot.parents() {
                match &scopes[parent.index()] {
                    Scope::Resolved(indices) => candidates
                        .extend(indices.iter().map(|&i| NodeId::new(parent, i))),
                    Scope::Rejected => parent_rejected = true,
                    Scope::NotSupplied => {}
                }
            }
            if candidates.is_empty() && parent_rejected {
                scopes[slot.id().index()] = Scope::Rejected;
                continue;
            }

            let resolved = match supplied {
                Supplied::Entities(entities) => {
                    let mut resolved = Resolved::new();
                    for entity in entities {
                        check_kind(slot, &entity)?;
                        if !slot.accepts(&entity) {
                            continue;
                        }
                        for index in
                            self.resolve(&template, slot, entity, &candidates, replace, journal)?
                        {
                            if !resolved.contains(&index) {
                                resolved.push(index);
                            }
                        }
                    }
                    resolved
                }
                Supplied::Row(nested) => {
                    let targets = self.resolve_graphs(&template, slot, &candidates, journal)?;
                    for &index in &targets {
                        let nested = nested.clone();
                        self.in_subgraph(NodeId::new(slot.id(), index), journal, |sub, j| {
                            sub.apply_row(nested, replace, j)
                        })?;
                    }
                    targets
                }
            };
            scopes[slot.id().index()] = if resolved.is_empty() {
                Scope::Rejected
            } else {
                Scope::Resolved(resolved)
            };
        }
        Ok(())
    }

    fn merge_nodes(&mut self, other: &GraphView<'_>, journal: &mut Journal) -> Result<(), AppendError> {
        let template = Arc::clone(&self.template);
        let source = other.graph();
        let mut mapping: HashMap<NodeId, Resolved> = HashMap::new();

        for other_slot in other.template().slots() {
            let container = source.container(other_slot.id());
            if container.nodes.is_empty() {
                continue;
            }
            let slot = template
                .get(other_slot.name())
                .ok_or_else(|| AppendError::UnknownSlot(other_slot.name().into()))?;

            // Parent positions of the other template mapped to parent slots here.
            let parent_map: SmallVec<[Option<SlotId>; 2]> = other_slot
                .parents()
                .iter()
                .map(|&p| {
                    let name = other.template().at(p).name();
                    template
                        .get(name)
                        .map(Slot::id)
                        .filter(|id| slot.parents().contains(id))
                })
                .collect();

            for (index, node) in container.nodes.iter().enumerate() {
                let mut candidates: SmallVec<[NodeId; 4]> = SmallVec::new();
                for (pos, parents) in node.parents.iter().enumerate() {
                    let Some(here) = parent_map[pos] else {
                        continue;
                    };
                    for &p in parents {
                        let from = NodeId::new(other_slot.parents()[pos], p);
                        for &mapped in mapping.get(&from).into_iter().flatten() {
                            let id = NodeId::new(here, mapped);
                            if !candidates.contains(&id) {
                                candidates.push(id);
                            }
                        }
                    }
                }
                let resolved = match node.sub.as_deref() {
                    Some(nested) => {
                        if !slot.entity_kind().is_graph() {
                            return Err(mismatch(slot, "a nested graph".to_owned()));
                        }
                        let targets = self.resolve_graphs(&template, slot, &candidates, journal)?;
                        for &target in &targets {
                            self.in_subgraph(NodeId::new(slot.id(), target), journal, |sub, j| {
                                sub.merge_nodes(&nested.view(), j)
                            })?;
                        }
                        targets
                    }
                    None => {
                        check_kind(slot, &node.entity)?;
                        self.resolve(&template, slot, node.entity.clone(), &candidates, false, journal)?
                    }
                };
                mapping.insert(NodeId::new(other_slot.id(), index as u32), resolved);
            }
        }
        Ok(())
    }

    /// Resolves one value of `slot` to existing or new nodes and links it to
    /// every candidate parent.
    fn resolve(
        &mut self,
        template: &GraphTemplate,
        slot: &Slot,
        entity: Entity,
        candidates: &[NodeId],
        replace: bool,
        journal: &mut Journal,
    ) -> Result<Resolved, AppendError> {
        let key = slot.identity().key(&entity);
        let reference = entity.as_record().is_some_and(Record::is_key_only);
        let matches: Resolved = self
            .container(slot.id())
            .matches(key.as_ref())
            .iter()
            .copied()
            .collect();

        if candidates.is_empty() {
            let index = if slot.is_root() {
                match matches.first() {
                    Some(&i) => i,
                    None if reference => return Err(AppendError::UnresolvedParent(slot.name.clone())),
                    None => return Ok(smallvec::smallvec![self.create_node(slot, entity, key, journal)]),
                }
            } else {
                match matches.as_slice() {
                    [i] => *i,
                    [] => return Err(AppendError::UnresolvedParent(slot.name.clone())),
                    many => {
                        return Err(AppendError::AmbiguousParent {
                            slot: slot.name.clone(),
                            matches: many.len(),
                        });
                    }
                }
            };
            if replace && !reference {
                self.replace_entity(NodeId::new(slot.id(), index), entity, journal);
            }
            return Ok(smallvec::smallvec![index]);
        }

        // Identical child already linked under each candidate parent, if any.
        let found: SmallVec<[Option<u32>; 4]> = candidates
            .iter()
            .map(|&parent| {
                matches
                    .iter()
                    .copied()
                    .find(|&m| self.edges.contains(&(parent, NodeId::new(slot.id(), m))))
            })
            .collect();

        let mut resolved = Resolved::new();
        let fallback = match found.iter().flatten().next() {
            Some(&i) => i,
            None if reference => return Err(AppendError::UnresolvedParent(slot.name.clone())),
            None => {
                let i = self.create_node(slot, entity.clone(), key, journal);
                resolved.push(i);
                i
            }
        };

        for (&parent, existing) in candidates.iter().zip(&found) {
            let index = existing.unwrap_or(fallback);
            self.add_edge(template, parent, NodeId::new(slot.id(), index), journal);
            if !resolved.contains(&index) {
                resolved.push(index);
                if replace && !reference {
                    self.replace_entity(NodeId::new(slot.id(), index), entity.clone(), journal);
                }
            }
        }
        Ok(resolved)
    }

    /// Sub-graph nodes a nested row or graph is folded into.
    ///
    /// Under each candidate parent these are the sub-graph nodes already
    /// linked to it; parents without one share a single new node. A root slot
    /// gets a new node per call. Without parents in the call, the slot's only
    /// node is used.
    fn resolve_graphs(
        &mut self,
        template: &GraphTemplate,
        slot: &Slot,
        candidates: &[NodeId],
        journal: &mut Journal,
    ) -> Result<Resolved, AppendError> {
        if candidates.is_empty() {
            if slot.is_root() {
                let index = self.create_node(slot, Entity::Scalar(Value::Null), None, journal);
                return Ok(smallvec::smallvec![index]);
            }
            return match self.container(slot.id()).nodes.len() {
                1 => Ok(smallvec::smallvec![0]),
                0 => Err(AppendError::UnresolvedParent(slot.name.clone())),
                n => Err(AppendError::AmbiguousParent {
                    slot: slot.name.clone(),
                    matches: n,
                }),
            };
        }

        let mut resolved = Resolved::new();
        let mut fresh = None;
        for &parent in candidates {
            let Some(pos) = template.at(parent.slot()).child_position(slot.id()) else {
                continue;
            };
            let linked: Resolved = self.node(parent).children[pos].iter().copied().collect();
            if linked.is_empty() {
                let index = match fresh {
                    Some(i) => i,
                    None => {
                        let i = self.create_node(slot, Entity::Scalar(Value::Null), None, journal);
                        fresh = Some(i);
                        i
                    }
                };
                self.add_edge(template, parent, NodeId::new(slot.id(), index), journal);
                if !resolved.contains(&index) {
                    resolved.push(index);
                }
            }
            for index in linked {
                if !resolved.contains(&index) {
                    resolved.push(index);
                }
            }
        }
        Ok(resolved)
    }

    /// Runs `f` on the nested graph of a sub-graph node, journaling its
    /// changes. A failing `f` leaves the nested graph unchanged.
    fn in_subgraph<F>(&mut self, id: NodeId, journal: &mut Journal, f: F) -> Result<(), AppendError>
    where
        F: FnOnce(&mut Graph, &mut Journal) -> Result<(), AppendError>,
    {
        let Some(sub) = self.containers[id.slot().index()].nodes[id.index()]
            .sub
            .as_deref_mut()
        else {
            return Ok(());
        };
        let mut nested = Journal::default();
        match f(sub, &mut nested) {
            Ok(()) => {
                journal.record(Change::Nested {
                    node: id,
                    journal: nested,
                });
                Ok(())
            }
            Err(err) => {
                sub.rollback(nested);
                Err(err)
            }
        }
    }

    fn create_node(
        &mut self,
        slot: &Slot,
        entity: Entity,
        key: Option<IdentityKey>,
        journal: &mut Journal,
    ) -> u32 {
        let sub = slot
            .entity_kind()
            .sub_template()
            .map(|t| Box::new(Graph::new(Arc::clone(t))));
        let container = &mut self.containers[slot.id().index()];
        let index = container.nodes.len() as u32;
        if let Some(key) = &key {
            container.keys.entry(key.clone()).or_default().push(index);
        }
        container.nodes.push(Node {
            entity,
            sub,
            key,
            children: vec![Vec::new(); slot.children().len()],
            parents: vec![Vec::new(); slot.parents().len()],
        });
        journal.record(Change::Node(NodeId::new(slot.id(), index)));
        index
    }

    fn add_edge(&mut self, template: &GraphTemplate, parent: NodeId, child: NodeId, journal: &mut Journal) {
        let (Some(child_pos), Some(parent_pos)) = (
            template.at(parent.slot()).child_position(child.slot()),
            template.at(child.slot()).parent_position(parent.slot()),
        ) else {
            return;
        };
        if !self.edges.insert((parent, child)) {
            return;
        }
        self.containers[parent.slot().index()].nodes[parent.index()].children[child_pos]
            .push(child.index);
        self.containers[child.slot().index()].nodes[child.index()].parents[parent_pos]
            .push(parent.index);
        journal.record(Change::Edge { parent, child });
    }

    fn replace_entity(&mut self, id: NodeId, entity: Entity, journal: &mut Journal) {
        let node = &mut self.containers[id.slot().index()].nodes[id.index()];
        let previous = std::mem::replace(&mut node.entity, entity);
        journal.record(Change::Replaced { node: id, previous });
    }
}

/// Maps slot names to ids, checks for repeats and splits nested rows from
/// entities. Does not touch any graph.
fn prepare<I, K, V>(template: &GraphTemplate, values: I) -> Result<PreparedRow, AppendError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<SlotValue>,
{
    let mut row: PreparedRow = vec![None; template.len()];
    let mut seen = vec![false; template.len()];
    for (name, value) in values {
        let name = name.as_ref();
        let slot = template
            .get(name)
            .ok_or_else(|| AppendError::UnknownSlot(name.into()))?;
        let i = slot.id().index();
        if std::mem::replace(&mut seen[i], true) {
            return Err(AppendError::RepeatedSlot(name.into()));
        }
        let value: SlotValue = value.into();
        row[i] = match (slot.entity_kind(), value) {
            (SlotKind::Graph(nested), SlotValue::Row(values)) => {
                Some(Supplied::Row(prepare(nested, values)?))
            }
            (_, SlotValue::Row(_)) => return Err(mismatch(slot, "a nested row".to_owned())),
            (kind, value) => {
                let entities = value.into_entities();
                match entities.first() {
                    None => None,
                    Some(entity) if kind.is_graph() => return Err(mismatch(slot, describe(entity))),
                    Some(_) => Some(Supplied::Entities(entities)),
                }
            }
        };
    }
    Ok(row)
}

fn check_kind(slot: &Slot, entity: &Entity) -> Result<(), AppendError> {
    if slot.entity_kind().accepts(entity) {
        return Ok(());
    }
    Err(mismatch(slot, describe(entity)))
}

fn describe(entity: &Entity) -> String {
    match entity {
        Entity::Record(r) => format!("record '{}'", r.entity_type().name()),
        Entity::Scalar(v) => format!("{} scalar", v.scalar_type()),
    }
}

fn mismatch(slot: &Slot, found: String) -> AppendError {
    AppendError::TypeMismatch {
        slot: slot.name.clone(),
        expected: slot.entity_kind().to_string(),
        found,
    }
}
