use thiserror::Error;

use crate::ScalarType;

/// Errors raised while describing entity types or building records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// An entity type declares the same attribute twice
    #[error("entity type '{entity}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute { entity: String, attribute: String },

    /// A record was given an attribute its type does not declare
    #[error("entity type '{entity}' has no attribute '{attribute}'")]
    UnknownAttribute { entity: String, attribute: String },

    /// A value does not fit the declared scalar type of an attribute
    #[error("attribute '{entity}.{attribute}' expects {expected}, got {found}")]
    TypeMismatch {
        entity: String,
        attribute: String,
        expected: ScalarType,
        found: ScalarType,
    },

    /// A positional row has a different number of values than the type has attributes
    #[error("entity type '{entity}' has {expected} attributes, row has {found} values")]
    WrongArity {
        entity: String,
        expected: usize,
        found: usize,
    },

    /// An entity type name was registered twice
    #[error("entity type '{0}' is already registered")]
    DuplicateType(String),

    /// An entity type name is not registered
    #[error("entity type '{0}' is not registered")]
    UnknownType(String),

    /// A descriptor is structurally invalid (e.g. empty name)
    #[error("invalid entity type: {0}")]
    InvalidType(String),
}
