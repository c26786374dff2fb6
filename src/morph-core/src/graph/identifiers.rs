//! Type identifiers for graph elements.

/// Node identifier, stable for the node's lifetime.
pub type NodeId = u64;

/// Graph identifier.
pub type GraphId = u64;

/// Generate a new unique node ID.
pub fn new_node_id() -> NodeId {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Generate a new unique graph ID.
pub fn new_graph_id() -> GraphId {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
