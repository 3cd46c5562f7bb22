//! Entity type descriptors
//!
//! An [`EntityType`] describes one record type (a table or a view): its name,
//! its attributes in column order and the subset of attributes forming the
//! primary key. Descriptors are plain data; they are produced by an external
//! schema reader or declared in code, and shared as `Arc<EntityType>`.

use std::borrow::Cow;
use std::sync::Arc;

use crate::{Attribute, AttributeDef, TypeError};

/// Runtime entity type descriptor
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityType {
    /// Type name (table or view name)
    pub name: Cow<'static, str>,
    /// Attributes in column order
    pub attributes: Vec<Attribute>,
    /// Documentation (typically the table comment)
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub doc: Option<Cow<'static, str>>,
}

impl EntityType {
    /// Start building a descriptor.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            ty: EntityType {
                name: name.into(),
                attributes: Vec::new(),
                doc: None,
            },
        }
    }

    /// Build a descriptor from const attribute definitions.
    ///
    /// ```
    /// use relgraph_types::{AttributeDef, EntityType, ScalarType};
    ///
    /// const BLOG: &[AttributeDef] = &[
    ///     AttributeDef::new("id", ScalarType::Integer).primary_key(),
    ///     AttributeDef::new("title", ScalarType::Text),
    /// ];
    ///
    /// let blog = EntityType::from_defs("blog", BLOG).unwrap();
    /// assert_eq!(blog.primary_key().count(), 1);
    /// ```
    pub fn from_defs(
        name: impl Into<Cow<'static, str>>,
        defs: &[AttributeDef],
    ) -> Result<Arc<Self>, TypeError> {
        defs.iter()
            .fold(Self::builder(name), |b, d| b.attribute(d.into_attribute()))
            .build()
    }

    /// Checks structural invariants: non-empty name, unique attribute names.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.is_empty() {
            return Err(TypeError::InvalidType("entity type name is empty".into()));
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.name.is_empty() {
                return Err(TypeError::InvalidType(format!(
                    "entity type '{}' has an attribute without a name",
                    self.name
                )));
            }
            if self.attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(TypeError::DuplicateAttribute {
                    entity: self.name.to_string(),
                    attribute: attr.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of attributes.
    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if the type declares no attribute.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Position of an attribute in column order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Looks an attribute up by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Primary key attributes with their positions, in column order.
    pub fn primary_key(&self) -> impl Iterator<Item = (usize, &Attribute)> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.primary_key)
    }

    /// Returns `true` if at least one attribute is flagged as primary key.
    pub fn has_primary_key(&self) -> bool {
        self.attributes.iter().any(|a| a.primary_key)
    }
}

/// Builder for [`EntityType`].
#[derive(Debug, Clone)]
pub struct EntityTypeBuilder {
    ty: EntityType,
}

impl EntityTypeBuilder {
    /// Append an attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.ty.attributes.push(attribute.into());
        self
    }

    /// Set documentation.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.ty.doc = Some(doc.into());
        self
    }

    /// Validate and share the descriptor.
    pub fn build(self) -> Result<Arc<EntityType>, TypeError> {
        self.ty.validate()?;
        Ok(Arc::new(self.ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScalarType;

    #[test]
    fn test_duplicate_attribute_rejected() {
        let err = EntityType::builder("blog")
            .attribute(Attribute::new("id", ScalarType::Integer))
            .attribute(Attribute::new("id", ScalarType::Text))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TypeError::DuplicateAttribute {
                entity: "blog".into(),
                attribute: "id".into()
            }
        );
    }

    #[test]
    fn test_composite_primary_key_in_column_order() {
        let ty = EntityType::builder("membership")
            .attribute(Attribute::new("user_id", ScalarType::Integer).primary_key())
            .attribute(Attribute::new("note", ScalarType::Text))
            .attribute(Attribute::new("group_id", ScalarType::Integer).primary_key())
            .build()
            .unwrap();

        let pk: Vec<_> = ty.primary_key().map(|(i, a)| (i, a.name.as_ref())).collect();
        assert_eq!(pk, vec![(0, "user_id"), (2, "group_id")]);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            EntityType::builder("").build(),
            Err(TypeError::InvalidType(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_descriptor() {
        let ty: EntityType = serde_json::from_str(
            r#"{
                "name": "post",
                "attributes": [
                    {"name": "id", "type": "integer", "primaryKey": true},
                    {"name": "blog_id", "type": "integer", "references": {"entity": "blog", "attribute": "id"}},
                    {"name": "title", "type": "text", "nullable": true, "doc": "Title"}
                ]
            }"#,
        )
        .unwrap();

        ty.validate().unwrap();
        assert_eq!(ty.position("title"), Some(2));
        assert!(ty.attribute("blog_id").unwrap().is_foreign_key());
        assert!(ty.has_primary_key());
    }
}
