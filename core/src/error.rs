use compact_str::CompactString;
use thiserror::Error;

pub use relgraph_types::TypeError;

/// Boxed error returned by user-supplied transforms and reducers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid template declarations. Always raised at declaration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A slot name was declared twice
    #[error("slot '{0}' is already declared")]
    DuplicateSlot(CompactString),

    /// A relation or query references an undeclared slot
    #[error("slot '{0}' is not declared")]
    UnknownSlot(CompactString),

    /// Relating the slots would make a slot its own ancestor
    #[error("relating '{parent}' to '{child}' would create a cycle")]
    CycleDetected {
        parent: CompactString,
        child: CompactString,
    },

    /// An identity policy was declared on a slot of the wrong kind
    #[error("slot '{slot}': identity policy {policy} requires a record slot")]
    PolicyMismatch {
        slot: CompactString,
        policy: &'static str,
    },

    /// An entity type lookup failed
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Failures of a single append, replace or merge call. The graph is left as
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    /// A value was supplied for an undeclared slot
    #[error("slot '{0}' is not declared")]
    UnknownSlot(CompactString),

    /// The same slot was supplied twice in one row
    #[error("slot '{0}' is supplied more than once")]
    RepeatedSlot(CompactString),

    /// A value does not match the slot's declared entity type
    #[error("slot '{slot}' expects {expected}, got {found}")]
    TypeMismatch {
        slot: CompactString,
        expected: String,
        found: String,
    },

    /// A value that can only address an existing node matched none
    #[error("slot '{0}': value does not resolve to an existing node")]
    UnresolvedParent(CompactString),

    /// A value addressed without parent scope matched several nodes
    #[error("slot '{slot}': value matches {matches} nodes without a parent to disambiguate")]
    AmbiguousParent { slot: CompactString, matches: usize },
}

/// Failures of view navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// The slot is not declared in the template
    #[error("slot '{0}' is not declared")]
    UnknownSlot(CompactString),

    /// The slot is declared but not related to the node's slot
    #[error("slot '{related}' is not related to slot '{slot}'")]
    NotRelated {
        slot: CompactString,
        related: CompactString,
    },
}

/// Failures of a serialization or schema call. The graph is not affected.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The serialization spec names an undeclared slot
    #[error("serialization spec references undeclared slot '{0}'")]
    UnknownSlot(CompactString),

    /// A custom reducer failed
    #[error("reducer for slot '{slot}' failed: {source}")]
    ReducerError {
        slot: CompactString,
        #[source]
        source: BoxError,
    },

    /// A custom transform failed
    #[error("transform for slot '{slot}' failed: {source}")]
    TransformError {
        slot: CompactString,
        #[source]
        source: BoxError,
    },

    /// Inserting a key would overwrite an existing one
    #[error("slot '{slot}' would overwrite key '{key}'")]
    MergeConflict { slot: CompactString, key: String },

    /// Merge-into-parent on a slot whose output is not a record
    #[error("slot '{0}' is merged into its parent but does not serialize to a record")]
    NotMergeable(CompactString),

    /// A node with emitted children did not serialize to a mapping
    #[error("slot '{0}' has emitted children but a node did not serialize to a mapping")]
    NotAMapping(CompactString),

    /// A pick default does not have the slot's output shape
    #[error("default value of slot '{0}' does not match its output shape")]
    DefaultMismatch(CompactString),

    /// A sub-graph serializer on a slot without nested graphs
    #[error("slot '{0}' does not hold sub-graphs")]
    NotASubgraph(CompactString),

    /// A custom reducer on a sub-graph slot
    #[error("slot '{0}' holds sub-graphs and cannot be folded")]
    FoldOnSubgraph(CompactString),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Any error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Append(#[from] AppendError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for graph operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
