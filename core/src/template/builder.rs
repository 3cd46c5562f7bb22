use std::borrow::Cow;
use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;
use relgraph_types::{Entity, EntityType, ScalarType};

use super::{EntityFilter, GraphTemplate, Slot, SlotId, SlotKind};
use crate::error::TemplateError;
use crate::identity::{IdentityPolicy, SharedPolicy};
use crate::serialize::Transform;
use crate::spec::GraphSpec;

#[derive(Debug, Clone)]
enum DeclKind {
    Kind(SlotKind),
    Typed(CompactString),
}

/// Declaration of one slot: its kind plus optional overrides.
///
/// Anything left unset is filled from the [`GraphSpec`] the template is
/// built with.
#[derive(Clone)]
pub struct SlotDecl {
    kind: DeclKind,
    identity: Option<SharedPolicy>,
    filter: Option<EntityFilter>,
    transform: Option<Transform>,
    doc: Option<Cow<'static, str>>,
}

impl SlotDecl {
    fn of(kind: DeclKind) -> Self {
        Self {
            kind,
            identity: None,
            filter: None,
            transform: None,
            doc: None,
        }
    }

    /// A slot of records of `ty`.
    pub fn record(ty: &Arc<EntityType>) -> Self {
        Self::of(DeclKind::Kind(SlotKind::Record(Arc::clone(ty))))
    }

    /// A slot of records of a type registered in the spec's type registry.
    pub fn typed(name: &str) -> Self {
        Self::of(DeclKind::Typed(name.into()))
    }

    /// A slot of scalars.
    pub fn scalar(ty: ScalarType) -> Self {
        Self::of(DeclKind::Kind(SlotKind::Scalar(ty)))
    }

    /// A slot accepting any entity.
    pub fn untyped() -> Self {
        Self::of(DeclKind::Kind(SlotKind::Untyped))
    }

    /// A slot whose nodes each hold a nested graph of `template`.
    ///
    /// Nested graphs are addressed per parent node, not by identity, and are
    /// never filtered.
    pub fn graph(template: &Arc<GraphTemplate>) -> Self {
        Self::of(DeclKind::Kind(SlotKind::Graph(Arc::clone(template))))
    }

    #[must_use]
    pub fn identity(mut self, policy: impl IdentityPolicy + 'static) -> Self {
        self.identity = Some(Arc::new(policy));
        self
    }

    #[must_use]
    pub fn shared_identity(mut self, policy: SharedPolicy) -> Self {
        self.identity = Some(policy);
        self
    }

    /// Entities for which `f` returns `false` are skipped on append.
    #[must_use]
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Entity) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl From<&Arc<EntityType>> for SlotDecl {
    fn from(ty: &Arc<EntityType>) -> Self {
        SlotDecl::record(ty)
    }
}

impl From<Arc<EntityType>> for SlotDecl {
    fn from(ty: Arc<EntityType>) -> Self {
        Self::of(DeclKind::Kind(SlotKind::Record(ty)))
    }
}

impl From<&Arc<GraphTemplate>> for SlotDecl {
    fn from(template: &Arc<GraphTemplate>) -> Self {
        SlotDecl::graph(template)
    }
}

impl From<ScalarType> for SlotDecl {
    fn from(ty: ScalarType) -> Self {
        SlotDecl::scalar(ty)
    }
}

/// Mutable template under construction.
///
/// Every declaration error is reported by the call that causes it; a builder
/// that only returned `Ok` builds a valid template.
#[derive(Debug)]
pub struct TemplateBuilder<'s> {
    spec: &'s GraphSpec,
    slots: Vec<Slot>,
    index: HashMap<CompactString, SlotId>,
}

impl<'s> TemplateBuilder<'s> {
    pub(crate) fn new(spec: &'s GraphSpec) -> Self {
        Self {
            spec,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Declares a slot.
    pub fn declare(
        &mut self,
        name: &str,
        decl: impl Into<SlotDecl>,
    ) -> Result<&mut Self, TemplateError> {
        if self.index.contains_key(name) {
            return Err(TemplateError::DuplicateSlot(name.into()));
        }
        let decl = decl.into();
        let kind = match decl.kind {
            DeclKind::Kind(kind) => kind,
            DeclKind::Typed(type_name) => {
                SlotKind::Record(Arc::clone(self.spec.registry().require(&type_name)?))
            }
        };

        let identity = match decl.identity {
            Some(policy) => policy,
            None => self.spec.default_identity(&kind),
        };
        if identity.requires_record() && !kind.is_record() {
            return Err(TemplateError::PolicyMismatch {
                slot: name.into(),
                policy: identity.name(),
            });
        }

        let filter = decl.filter.or_else(|| self.spec.default_filter(&kind));
        let transform = decl
            .transform
            .unwrap_or_else(|| self.spec.default_transform(&kind));
        let doc = decl
            .doc
            .or_else(|| kind.entity_type().and_then(|ty| ty.doc.clone()));

        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot {
            id,
            name: name.into(),
            kind,
            identity,
            filter,
            transform,
            doc,
            parents: Vec::new(),
            children: Vec::new(),
        });
        self.index.insert(name.into(), id);
        Ok(self)
    }

    /// Declares several slots in order.
    pub fn declare_all<I, K, D>(&mut self, decls: I) -> Result<&mut Self, TemplateError>
    where
        I: IntoIterator<Item = (K, D)>,
        K: AsRef<str>,
        D: Into<SlotDecl>,
    {
        for (name, decl) in decls {
            self.declare(name.as_ref(), decl)?;
        }
        Ok(self)
    }

    /// Declares `parent` as the parent of each of `children`.
    ///
    /// Relating an already related pair is a no-op.
    pub fn relate<I, S>(&mut self, parent: &str, children: I) -> Result<&mut Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parent_id = self.lookup(parent)?;
        let child_ids = children
            .into_iter()
            .map(|c| self.lookup(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        for child_id in child_ids {
            if self.slots[parent_id.index()].children.contains(&child_id) {
                continue;
            }
            if child_id == parent_id || self.reaches(child_id, parent_id) {
                return Err(TemplateError::CycleDetected {
                    parent: parent.into(),
                    child: self.slots[child_id.index()].name.clone(),
                });
            }
            self.slots[parent_id.index()].children.push(child_id);
            self.slots[child_id.index()].parents.push(parent_id);
        }
        Ok(self)
    }

    /// Copies every slot and relation of `other` into this template.
    pub fn include(&mut self, other: &GraphTemplate) -> Result<&mut Self, TemplateError> {
        if let Some(clash) = other.slots_by_id().iter().find(|s| self.index.contains_key(s.name())) {
            return Err(TemplateError::DuplicateSlot(clash.name.clone()));
        }
        let offset = self.slots.len() as u32;
        let shift = |id: &SlotId| SlotId(id.0 + offset);
        for slot in other.slots_by_id() {
            let mut copy = slot.clone();
            copy.id = shift(&slot.id);
            copy.parents = slot.parents.iter().map(shift).collect();
            copy.children = slot.children.iter().map(shift).collect();
            self.index.insert(copy.name.clone(), copy.id);
            self.slots.push(copy);
        }
        Ok(self)
    }

    /// Freezes the template.
    pub fn build(self) -> Arc<GraphTemplate> {
        Arc::new(GraphTemplate::from_parts(
            self.spec.config().name.as_str().into(),
            self.slots,
            self.index,
        ))
    }

    fn lookup(&self, name: &str) -> Result<SlotId, TemplateError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TemplateError::UnknownSlot(name.into()))
    }

    /// Whether `to` is a descendant of `from`.
    fn reaches(&self, from: SlotId, to: SlotId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.slots.len()];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            stack.extend(self.slots[id.index()].children.iter().copied());
        }
        false
    }
}
