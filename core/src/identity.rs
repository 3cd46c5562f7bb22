//! Identity policies
//!
//! A policy decides whether two entities denote the same real-world record.
//! Graph containers index their nodes by [`IdentityKey`], so a policy is
//! expressed as a key function: two entities are identical when both produce
//! a key and the keys are equal. [`IdentityPolicy::identical`] is provided for
//! callers and must agree with [`IdentityPolicy::key`].

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use relgraph_types::{Entity, KeyValues, Value};

/// Hashable identity of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    scope: Option<CompactString>,
    values: KeyValues,
}

impl IdentityKey {
    /// Creates a key. `scope` is typically the entity type name so that
    /// records of different types never collide.
    pub fn new(scope: Option<&str>, values: KeyValues) -> Self {
        Self {
            scope: scope.map(CompactString::from),
            values,
        }
    }

    #[inline]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Decides entity identity for one slot.
pub trait IdentityPolicy: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Identity key of an entity; `None` means "never identical to anything".
    fn key(&self, entity: &Entity) -> Option<IdentityKey>;

    /// Returns `true` when both entities produce the same key.
    fn identical(&self, a: &Entity, b: &Entity) -> bool {
        match (self.key(a), self.key(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Returns `true` if the policy only makes sense on record slots.
    fn requires_record(&self) -> bool {
        false
    }
}

/// Shared, type-erased identity policy.
pub type SharedPolicy = Arc<dyn IdentityPolicy>;

/// Records are identical when they share a type and a fully present primary key.
///
/// Scalars and records of types without a primary key are never identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimaryKey;

impl IdentityPolicy for PrimaryKey {
    fn name(&self) -> &'static str {
        "primary_key"
    }

    fn key(&self, entity: &Entity) -> Option<IdentityKey> {
        let record = entity.as_record()?;
        let values = record.primary_key()?;
        Some(IdentityKey::new(Some(record.entity_type().name()), values))
    }

    fn requires_record(&self) -> bool {
        true
    }
}

/// Nothing is ever identical; every value creates a new node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Never;

impl IdentityPolicy for Never {
    fn name(&self) -> &'static str {
        "never"
    }

    fn key(&self, _entity: &Entity) -> Option<IdentityKey> {
        None
    }
}

/// Scalars are identical when their values are equal and not NULL.
///
/// Records are never identical under this policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByValue;

impl IdentityPolicy for ByValue {
    fn name(&self) -> &'static str {
        "by_value"
    }

    fn key(&self, entity: &Entity) -> Option<IdentityKey> {
        match entity.as_scalar()? {
            Value::Null => None,
            v => Some(IdentityKey::new(None, smallvec::smallvec![v.clone()])),
        }
    }
}

/// Identity computed by a caller-supplied key function.
pub struct ByKey<F> {
    f: F,
}

impl<F> fmt::Debug for ByKey<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByKey").finish_non_exhaustive()
    }
}

impl<F> IdentityPolicy for ByKey<F>
where
    F: Fn(&Entity) -> Option<KeyValues> + Send + Sync,
{
    fn name(&self) -> &'static str {
        "by_key"
    }

    fn key(&self, entity: &Entity) -> Option<IdentityKey> {
        (self.f)(entity).map(|values| IdentityKey::new(entity.type_name(), values))
    }
}

/// Builds a policy from a key function.
///
/// ```
/// use relgraph_core::identity::{by_key, IdentityPolicy};
/// use relgraph_types::{Entity, Value};
///
/// // Case-insensitive text identity.
/// let policy = by_key(|e: &Entity| {
///     let text = e.as_scalar()?.as_str()?;
///     Some(smallvec::smallvec![Value::from(text.to_lowercase())])
/// });
/// assert!(policy.identical(&Entity::from("Rust"), &Entity::from("rust")));
/// ```
pub fn by_key<F>(f: F) -> ByKey<F>
where
    F: Fn(&Entity) -> Option<KeyValues> + Send + Sync,
{
    ByKey { f }
}
