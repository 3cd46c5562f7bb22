//! Explicit registry of entity types.

use std::sync::Arc;

use crate::{EntityType, TypeError};

/// Name → descriptor registry, in registration order.
///
/// Replaces any process-wide model namespace: callers own a registry and pass
/// it where descriptors need to be looked up by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: Vec<Arc<EntityType>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a descriptor.
    pub fn register(&mut self, ty: impl Into<Arc<EntityType>>) -> Result<Arc<EntityType>, TypeError> {
        let ty = ty.into();
        ty.validate()?;
        if self.get(ty.name()).is_some() {
            return Err(TypeError::DuplicateType(ty.name().to_owned()));
        }
        self.types.push(Arc::clone(&ty));
        Ok(ty)
    }

    /// Looks a descriptor up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Like [`TypeRegistry::get`], failing with [`TypeError::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&Arc<EntityType>, TypeError> {
        self.get(name)
            .ok_or_else(|| TypeError::UnknownType(name.to_owned()))
    }

    /// Registered descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.types.iter()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
