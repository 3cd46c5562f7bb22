//! # relgraph
//!
//! Fold flat relational query rows into deduplicated entity graphs, then
//! serialize them into nested values.
//!
//! ## Quick Start
//!
//! ```rust
//! use relgraph::prelude::*;
//! use serde_json::json;
//!
//! const BLOG: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//! const POST: &[AttributeDef] = &[
//!     AttributeDef::new("id", ScalarType::Integer).primary_key(),
//!     AttributeDef::new("blog_id", ScalarType::Integer).references("blog", "id"),
//!     AttributeDef::new("title", ScalarType::Text),
//! ];
//!
//! # fn main() -> relgraph::Result<()> {
//! let blog = EntityType::from_defs("blog", BLOG)?;
//! let post = EntityType::from_defs("post", POST)?;
//!
//! let mut builder = GraphTemplate::builder();
//! builder.declare("blog", &blog)?.declare("post", &post)?;
//! builder.relate("blog", ["post"])?;
//! let template = builder.build();
//!
//! // One call per joined row; the blog repeats, the posts differ.
//! let mut graph = Graph::new(template);
//! graph.append(row! {
//!     "blog" => record!(blog, { "id" => 1, "title" => "A" })?,
//!     "post" => record!(post, { "id" => 10, "blog_id" => 1, "title" => "P1" })?,
//! })?;
//! graph.append(row! {
//!     "blog" => record!(blog, { "id" => 1 })?,
//!     "post" => record!(post, { "id" => 11, "blog_id" => 1, "title" => "P2" })?,
//! })?;
//!
//! let spec = SerializationSpec::all(graph.template());
//! let out = relgraph::serialize(&graph.view(), &spec)?;
//! assert_eq!(
//!     out,
//!     json!({ "blog": [{
//!         "id": 1,
//!         "title": "A",
//!         "post": [
//!             { "id": 10, "blog_id": 1, "title": "P1" },
//!             { "id": 11, "blog_id": 1, "title": "P2" },
//!         ],
//!     }] })
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate            | Contents                                             |
//! |------------------|------------------------------------------------------|
//! | `relgraph-types` | entity type descriptors, records and scalar values   |
//! | `relgraph-core`  | templates, graphs, views, identity and serialization |

/// Result type for relgraph operations
pub use relgraph_core::error::Result;

/// Row and record construction macros
pub use relgraph_core::row;
pub use relgraph_types::record;

/// Error types
pub mod error {
    pub use relgraph_core::error::{
        AppendError, BoxError, ConfigError, Error, SerializeError, TemplateError, ViewError,
    };
    pub use relgraph_types::TypeError;
}

/// Entity type descriptors.
pub use relgraph_types as types;

pub use relgraph_core::{
    ByKey, ByValue, ContainerView, EntityFilter, Graph, GraphConfig, GraphSpec, GraphTemplate,
    GraphView, IdentityKey, IdentityPolicy, Never, NodeId, NodeRef, PrimaryKey, Slot, SlotDecl,
    SlotId, SlotKind, SlotValue, TemplateBuilder, by_key,
};

/// Serialization in data and schema modes.
///
/// ```rust
/// use relgraph::serialize::SlotSerializer;
///
/// let first_tag = SlotSerializer::new().name("tag").head_or(serde_json::json!("none"));
/// assert!(!first_tag.is_merged());
/// ```
pub mod serialize {
    pub use relgraph_core::serialize::{
        EachFn, Field, FoldFn, RecordShape, RenameFn, Schema, SelectFn, SerializationSpec,
        SerializePlan, Shape, SlotSerializer, Transform, TransformFn, record_to_json, schema,
        serialize, value_to_json,
    };
}

pub use serialize::{Schema, SerializationSpec, Shape, SlotSerializer, Transform, schema, serialize};

/// Everything needed to declare, fill and serialize graphs.
pub mod prelude {
    pub use crate::serialize::{SerializationSpec, Shape, SlotSerializer, Transform};
    pub use crate::{record, row};
    pub use relgraph_core::{
        Graph, GraphConfig, GraphSpec, GraphTemplate, GraphView, IdentityPolicy, SlotDecl,
        SlotValue, by_key,
    };
    pub use relgraph_core::identity::{ByValue, Never, PrimaryKey};
    pub use relgraph_types::{
        Attribute, AttributeDef, Entity, EntityType, Record, ScalarType, TypeRegistry, Value,
    };
}
