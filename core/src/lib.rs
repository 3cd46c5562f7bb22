//! Graph engine for relgraph
//!
//! - [`template`] - slot declarations and relations ([`GraphTemplate`])
//! - [`graph`] - append, merge and navigation ([`Graph`], [`GraphView`])
//! - [`identity`] - deduplication policies
//! - [`serialize`] - data and schema output
//! - [`spec`] / [`config`] - defaults shared by templates and serializers
//!
//! # Features
//!
//! - `tracing` - emit `tracing` events for appends, rollbacks and serialization
//! - `profiling` - puffin scopes around append and serialization

pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod profiling;
pub mod serialize;
pub mod spec;
pub mod template;
pub mod tracing;

pub use config::GraphConfig;
pub use error::{
    AppendError, BoxError, ConfigError, Error, Result, SerializeError, TemplateError, TypeError,
    ViewError,
};
pub use graph::{ContainerView, Graph, GraphView, NodeId, NodeRef, SlotValue};
pub use identity::{ByKey, ByValue, IdentityKey, IdentityPolicy, Never, PrimaryKey, by_key};
pub use serialize::{Schema, SerializationSpec, Shape, SlotSerializer, Transform};
pub use spec::GraphSpec;
pub use template::{EntityFilter, GraphTemplate, Slot, SlotDecl, SlotId, SlotKind, TemplateBuilder};
