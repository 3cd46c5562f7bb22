//! Record values and graph entities.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{Attribute, EntityType, TypeError, Value};

/// Primary key values of a record, in key order.
pub type KeyValues = SmallVec<[Value; 2]>;

/// A typed record reference.
///
/// Holds one slot per attribute of its [`EntityType`]. A slot is either
/// absent (`None`, the attribute was not selected or not given) or present
/// with a [`Value`], which may be NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    ty: Arc<EntityType>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// A record of `ty` with every attribute absent.
    pub fn new(ty: &Arc<EntityType>) -> Self {
        Self {
            ty: Arc::clone(ty),
            values: vec![None; ty.len()],
        }
    }

    /// Builds a record from `(attribute, value)` pairs; missing attributes stay absent.
    pub fn from_pairs<I, K, V>(ty: &Arc<EntityType>, pairs: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::new(ty);
        for (k, v) in pairs {
            record.set(k.as_ref(), v)?;
        }
        Ok(record)
    }

    /// Builds a record from positional row values in attribute order.
    pub fn from_row<I>(ty: &Arc<EntityType>, row: I) -> Result<Self, TypeError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = row.into_iter().map(Into::into).collect();
        if values.len() != ty.len() {
            return Err(TypeError::WrongArity {
                entity: ty.name().to_owned(),
                expected: ty.len(),
                found: values.len(),
            });
        }
        let mut record = Self::new(ty);
        for (i, v) in values.into_iter().enumerate() {
            record.set_at(i, v)?;
        }
        Ok(record)
    }

    /// Sets an attribute by name.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<&mut Self, TypeError> {
        let index = self
            .ty
            .position(attribute)
            .ok_or_else(|| TypeError::UnknownAttribute {
                entity: self.ty.name().to_owned(),
                attribute: attribute.to_owned(),
            })?;
        self.set_at(index, value.into())?;
        Ok(self)
    }

    /// Consuming variant of [`Record::set`].
    pub fn with(mut self, attribute: &str, value: impl Into<Value>) -> Result<Self, TypeError> {
        self.set(attribute, value)?;
        Ok(self)
    }

    fn set_at(&mut self, index: usize, value: Value) -> Result<(), TypeError> {
        let attr = &self.ty.attributes[index];
        if !attr.scalar_type.accepts(&value) {
            return Err(TypeError::TypeMismatch {
                entity: self.ty.name().to_owned(),
                attribute: attr.name.to_string(),
                expected: attr.scalar_type,
                found: value.scalar_type(),
            });
        }
        self.values[index] = Some(value);
        Ok(())
    }

    /// The record's type.
    #[inline]
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.ty
    }

    /// Value of an attribute; `None` when absent or unknown.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.ty
            .position(attribute)
            .and_then(|i| self.values[i].as_ref())
    }

    /// Attributes paired with their values, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&Attribute, Option<&Value>)> {
        self.ty
            .attributes
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }

    /// Primary key values, or `None` when the type has no primary key or any
    /// key attribute is absent or NULL.
    pub fn primary_key(&self) -> Option<KeyValues> {
        if !self.ty.has_primary_key() {
            return None;
        }
        self.ty
            .primary_key()
            .map(|(i, _)| match &self.values[i] {
                Some(v) if !v.is_null() => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` when every key attribute is present and every other
    /// attribute is absent: a reference to a known record, not its data.
    pub fn is_key_only(&self) -> bool {
        if self.ty.primary_key().count() == self.ty.len() {
            return false;
        }
        self.primary_key().is_some()
            && self
                .iter()
                .all(|(attr, value)| attr.primary_key || value.is_none())
    }

    /// Returns `true` when every attribute is absent or NULL.
    pub fn is_null(&self) -> bool {
        self.values.iter().flatten().all(Value::is_null)
    }
}

/// A value stored in a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A typed record reference
    Record(Record),
    /// An opaque scalar; NULL means "no value for this row"
    Scalar(Value),
}

impl Entity {
    /// Returns the record, if this is one.
    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Entity::Record(r) => Some(r),
            Entity::Scalar(_) => None,
        }
    }

    /// Returns the scalar, if this is one.
    #[inline]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Entity::Scalar(v) => Some(v),
            Entity::Record(_) => None,
        }
    }

    /// Returns `true` for a NULL scalar.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, Entity::Scalar(Value::Null))
    }

    /// Name of the entity type for records.
    pub fn type_name(&self) -> Option<&str> {
        self.as_record().map(|r| r.entity_type().name())
    }
}

impl From<Record> for Entity {
    #[inline]
    fn from(r: Record) -> Self {
        Entity::Record(r)
    }
}

impl From<Value> for Entity {
    #[inline]
    fn from(v: Value) -> Self {
        Entity::Scalar(v)
    }
}

macro_rules! impl_entity_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Entity {
                #[inline]
                fn from(v: $t) -> Self {
                    Entity::Scalar(Value::from(v))
                }
            }
        )*
    };
}

impl_entity_from_scalar!(
    bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String, Vec<u8>
);
