//! Graph specification
//!
//! A [`GraphSpec`] bundles what templates and serializers are built from:
//! the [`GraphConfig`], the [`TypeRegistry`] used by [`SlotDecl::typed`],
//! and per-type defaults for identity, entity filter and base transform.
//!
//! [`SlotDecl::typed`]: crate::SlotDecl::typed

use std::sync::{Arc, LazyLock};

use hashbrown::HashMap;
use relgraph_types::{Entity, TypeRegistry};
use serde_json::Value as Json;

use crate::config::GraphConfig;
use crate::error::SerializeError;
use crate::graph::GraphView;
use crate::identity::{IdentityPolicy, Never, PrimaryKey, SharedPolicy};
use crate::serialize::{self, Schema, SerializationSpec, Transform};
use crate::template::{EntityFilter, GraphTemplate, SlotKind, TemplateBuilder};

static DEFAULT_SPEC: LazyLock<GraphSpec> = LazyLock::new(GraphSpec::default);

/// Defaults and registrations shared by templates and serializers.
#[derive(Clone, Default)]
pub struct GraphSpec {
    config: GraphConfig,
    registry: TypeRegistry,
    identities: HashMap<String, SharedPolicy>,
    filters: HashMap<String, EntityFilter>,
    transforms: HashMap<String, Transform>,
}

impl GraphSpec {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The spec behind [`GraphTemplate::builder`]: default configuration and
    /// no registrations.
    pub fn global() -> &'static GraphSpec {
        &DEFAULT_SPEC
    }

    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Identity policy for record slots of `type_name`.
    pub fn add_identity(
        &mut self,
        type_name: &str,
        policy: impl IdentityPolicy + 'static,
    ) -> &mut Self {
        self.identities.insert(type_name.to_owned(), Arc::new(policy));
        self
    }

    /// Entity filter for record slots of `type_name`.
    pub fn add_filter<F>(&mut self, type_name: &str, f: F) -> &mut Self
    where
        F: Fn(&Entity) -> bool + Send + Sync + 'static,
    {
        self.filters.insert(type_name.to_owned(), Arc::new(f));
        self
    }

    /// Base transform for record slots of `type_name`.
    pub fn add_transform(&mut self, type_name: &str, transform: Transform) -> &mut Self {
        self.transforms.insert(type_name.to_owned(), transform);
        self
    }

    /// Starts a template whose slots take their defaults from this spec.
    pub fn new_template(&self) -> TemplateBuilder<'_> {
        TemplateBuilder::new(self)
    }

    /// Alias of [`serialize::serialize`].
    ///
    /// Slot defaults of this spec are fixed into templates when they are
    /// declared, so serialization needs nothing further from it.
    pub fn to_value(
        &self,
        view: &GraphView<'_>,
        spec: &SerializationSpec,
    ) -> Result<Json, SerializeError> {
        serialize::serialize(view, spec)
    }

    /// Alias of [`serialize::schema`].
    pub fn to_schema(
        &self,
        template: &GraphTemplate,
        spec: &SerializationSpec,
    ) -> Result<Schema, SerializeError> {
        serialize::schema(template, spec)
    }

    pub(crate) fn default_identity(&self, kind: &SlotKind) -> SharedPolicy {
        match kind {
            SlotKind::Record(ty) => match self.identities.get(ty.name()) {
                Some(policy) => Arc::clone(policy),
                None if self.config.primary_key_identity => Arc::new(PrimaryKey),
                None => Arc::new(Never),
            },
            SlotKind::Scalar(_) | SlotKind::Untyped | SlotKind::Graph(_) => Arc::new(Never),
        }
    }

    pub(crate) fn default_filter(&self, kind: &SlotKind) -> Option<EntityFilter> {
        let ty = kind.entity_type()?;
        if let Some(f) = self.filters.get(ty.name()) {
            return Some(Arc::clone(f));
        }
        self.config.skip_null_records.then(|| {
            Arc::new(|e: &Entity| !e.as_record().is_some_and(|r| r.is_null())) as EntityFilter
        })
    }

    pub(crate) fn default_transform(&self, kind: &SlotKind) -> Transform {
        match kind {
            SlotKind::Record(ty) => self
                .transforms
                .get(ty.name())
                .cloned()
                .unwrap_or(Transform::Record {
                    include_foreign_keys: self.config.include_foreign_keys,
                }),
            SlotKind::Scalar(_) | SlotKind::Untyped | SlotKind::Graph(_) => Transform::Identity,
        }
    }
}

impl std::fmt::Debug for GraphSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSpec")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("identities", &self.identities)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("transforms", &self.transforms)
            .finish()
    }
}
