//! Attribute descriptors
//!
//! This module provides two complementary types:
//! - [`AttributeDef`] - A const-friendly definition type for compile-time descriptors
//! - [`Attribute`] - A runtime type for serde serialization/deserialization

use std::borrow::Cow;

use crate::ScalarType;

// =============================================================================
// Foreign Key Reference
// =============================================================================

/// Target of a foreign-key attribute (const-friendly)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceDef {
    /// Referenced entity type name
    pub entity: &'static str,
    /// Referenced attribute name
    pub attribute: &'static str,
}

/// Target of a foreign-key attribute (runtime)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    /// Referenced entity type name
    pub entity: Cow<'static, str>,
    /// Referenced attribute name
    pub attribute: Cow<'static, str>,
}

impl ReferenceDef {
    /// Convert to runtime type
    #[must_use]
    pub const fn into_reference(self) -> Reference {
        Reference {
            entity: Cow::Borrowed(self.entity),
            attribute: Cow::Borrowed(self.attribute),
        }
    }
}

// =============================================================================
// Const-friendly Definition Type
// =============================================================================

/// Const-friendly attribute definition.
///
/// # Examples
///
/// ```
/// use relgraph_types::{AttributeDef, ScalarType};
///
/// const POST: &[AttributeDef] = &[
///     AttributeDef::new("id", ScalarType::Integer).primary_key(),
///     AttributeDef::new("blog_id", ScalarType::Integer).not_null().references("blog", "id"),
///     AttributeDef::new("title", ScalarType::Text).doc("Post title"),
/// ];
///
/// assert!(POST[0].primary_key);
/// assert!(!POST[2].nullable);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeDef {
    /// Attribute name
    pub name: &'static str,
    /// Scalar type of the attribute
    pub scalar_type: ScalarType,
    /// Whether the attribute may hold NULL
    pub nullable: bool,
    /// Whether the attribute is part of the primary key
    pub primary_key: bool,
    /// Foreign key target, if any
    pub references: Option<ReferenceDef>,
    /// Documentation (typically the column comment)
    pub doc: Option<&'static str>,
}

impl AttributeDef {
    /// Create a new, non-null attribute definition
    #[must_use]
    pub const fn new(name: &'static str, scalar_type: ScalarType) -> Self {
        Self {
            name,
            scalar_type,
            nullable: false,
            primary_key: false,
            references: None,
            doc: None,
        }
    }

    /// Mark as part of the primary key (also clears nullability)
    #[must_use]
    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            nullable: false,
            ..self
        }
    }

    /// Alias for primary_key()
    #[must_use]
    pub const fn primary(self) -> Self {
        self.primary_key()
    }

    /// Allow NULL
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Disallow NULL
    #[must_use]
    pub const fn not_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    /// Set the foreign key target
    #[must_use]
    pub const fn references(self, entity: &'static str, attribute: &'static str) -> Self {
        Self {
            references: Some(ReferenceDef { entity, attribute }),
            ..self
        }
    }

    /// Set documentation
    #[must_use]
    pub const fn doc(self, doc: &'static str) -> Self {
        Self {
            doc: Some(doc),
            ..self
        }
    }

    /// Convert to runtime type
    #[must_use]
    pub const fn into_attribute(self) -> Attribute {
        Attribute {
            name: Cow::Borrowed(self.name),
            scalar_type: self.scalar_type,
            nullable: self.nullable,
            primary_key: self.primary_key,
            references: match self.references {
                Some(r) => Some(r.into_reference()),
                None => None,
            },
            doc: match self.doc {
                Some(d) => Some(Cow::Borrowed(d)),
                None => None,
            },
        }
    }
}

// =============================================================================
// Runtime Type for Serde
// =============================================================================

/// Runtime attribute descriptor
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Attribute {
    /// Attribute name
    pub name: Cow<'static, str>,
    /// Scalar type of the attribute
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub scalar_type: ScalarType,
    /// Whether the attribute may hold NULL
    #[cfg_attr(feature = "serde", serde(default))]
    pub nullable: bool,
    /// Whether the attribute is part of the primary key
    #[cfg_attr(feature = "serde", serde(default))]
    pub primary_key: bool,
    /// Foreign key target, if any
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub references: Option<Reference>,
    /// Documentation
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub doc: Option<Cow<'static, str>>,
}

impl Attribute {
    /// Create a new, non-null attribute
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar_type,
            nullable: false,
            primary_key: false,
            references: None,
            doc: None,
        }
    }

    /// Mark as part of the primary key (also clears nullability)
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Allow NULL
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the foreign key target
    #[must_use]
    pub fn references(
        mut self,
        entity: impl Into<Cow<'static, str>>,
        attribute: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.references = Some(Reference {
            entity: entity.into(),
            attribute: attribute.into(),
        });
        self
    }

    /// Set documentation
    #[must_use]
    pub fn doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Returns `true` if this attribute references another entity type.
    #[inline]
    #[must_use]
    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

impl From<AttributeDef> for Attribute {
    fn from(def: AttributeDef) -> Self {
        def.into_attribute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_def_into_attribute() {
        const DEF: AttributeDef = AttributeDef::new("blog_id", ScalarType::Integer)
            .nullable()
            .references("blog", "id")
            .doc("owning blog");

        let attr = DEF.into_attribute();
        assert_eq!(attr.name, "blog_id");
        assert!(attr.nullable);
        assert!(attr.is_foreign_key());
        assert_eq!(attr.doc.as_deref(), Some("owning blog"));
    }

    #[test]
    fn test_primary_key_clears_nullable() {
        let attr = Attribute::new("id", ScalarType::Integer)
            .nullable()
            .primary_key();
        assert!(attr.primary_key);
        assert!(!attr.nullable);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_attribute_deserialize_defaults() {
        let attr: Attribute =
            serde_json::from_str(r#"{"name": "title", "type": "text"}"#).unwrap();
        assert_eq!(attr.scalar_type, ScalarType::Text);
        assert!(!attr.nullable);
        assert!(!attr.primary_key);
        assert!(attr.references.is_none());
    }
}
