//! Tracing utilities for graph append and serialization observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event after a successful append or merge.
///
/// ```ignore
/// relgraph_trace_append!(template.label(), "append", slots, created, edges);
/// ```
#[macro_export]
macro_rules! relgraph_trace_append {
    ($graph:expr, $op:expr, $slots:expr, $created:expr, $edges:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(
            graph = $graph,
            op = $op,
            slots = $slots,
            nodes_created = $created,
            edges_added = $edges,
            "relgraph.append"
        );
    };
}

/// Emit a warn-level event when a failed append is rolled back.
#[macro_export]
macro_rules! relgraph_trace_rollback {
    ($graph:expr, $op:expr, $err:expr, $undone:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(
            graph = $graph,
            op = $op,
            error = %$err,
            undone = $undone,
            "relgraph.rollback"
        );
    };
}

/// Emit a debug-level event for a serialization pass.
///
/// ```ignore
/// relgraph_trace_serialize!(template.label(), "data", roots.len());
/// ```
#[macro_export]
macro_rules! relgraph_trace_serialize {
    ($graph:expr, $mode:literal, $roots:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(graph = $graph, mode = $mode, roots = $roots, "relgraph.serialize");
    };
}
